/*!
 * Source file discovery and region resolution
 *
 * The input directory is scanned one level deep. A file is selected when
 * its lowercased name ends with `.csv` and carries an in-scope region code
 * either as `{uf}_` anywhere or as a `_{uf}.csv` suffix.
 */

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SplitError};

/// Region assigned when the file name carries no recognizable code
pub const UNKNOWN_REGION: &str = "XX";

/// One input file and the region it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub region: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, region: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            region: region.into(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without the `.csv` extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Whether a file name is a CSV tagged with one of `regions`
pub fn matches_region_pattern(file_name: &str, regions: &[String]) -> bool {
    let lower = file_name.to_lowercase();
    if !lower.ends_with(".csv") {
        return false;
    }
    regions.iter().any(|uf| tagged_with(&lower, uf))
}

fn tagged_with(lower_name: &str, region: &str) -> bool {
    let uf = region.to_lowercase();
    lower_name.contains(&format!("{}_", uf)) || lower_name.ends_with(&format!("_{}.csv", uf))
}

/// Region for a file name: first configured region that tags it, else the
/// last `_` part of the stem when that is a configured region, else `XX`.
pub fn extract_region(file_name: &str, regions: &[String]) -> String {
    let lower = file_name.to_lowercase();
    if let Some(uf) = regions.iter().find(|uf| tagged_with(&lower, uf)) {
        return uf.to_uppercase();
    }

    let stem = file_name.replace(".csv", "");
    let stem = stem.trim().to_uppercase();
    if let Some(last) = stem.rsplit('_').next() {
        if last.len() == 2 && regions.iter().any(|uf| uf.eq_ignore_ascii_case(last)) {
            return last.to_string();
        }
    }

    UNKNOWN_REGION.to_string()
}

/// List matching CSV files directly inside `input_dir`, sorted by path
pub fn discover_sources(input_dir: &Path, regions: &[String]) -> Result<Vec<SourceFile>> {
    if !input_dir.is_dir() {
        return Err(SplitError::InputNotFound(input_dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    let walker = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Failed to read input directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if !matches_region_pattern(&file_name, regions) {
            debug!(file = %file_name, "Skipping file without region tag");
            continue;
        }

        let region = extract_region(&file_name, regions);
        sources.push(SourceFile::new(entry.path(), region));
    }

    if sources.is_empty() {
        return Err(SplitError::NoSourceFiles(input_dir.to_path_buf()));
    }

    info!(
        dir = %input_dir.display(),
        files = sources.len(),
        "Source files found"
    );
    Ok(sources)
}
