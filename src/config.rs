/*!
 * Configuration types for Switchboard
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SplitError};

/// Name of the log file created inside the output directory by default
pub const DEFAULT_LOG_FILE_NAME: &str = "processamento.log";

/// Main configuration for a partitioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Directory scanned for input CSV extracts
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving the per-region, per-carrier files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of files processed concurrently (0 = CPU count)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Region codes (UF) whose files are selected
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Emit a progress event every N data rows
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Validate numbers against the built-in Brazilian numbering plan
    #[serde(default = "default_true")]
    pub numbering_plan: bool,

    /// Optional `prefix;carrier` table used for authoritative carrier names
    #[serde(default)]
    pub carrier_table: Option<PathBuf>,

    /// Output file naming policy
    #[serde(default)]
    pub output_naming: OutputNaming,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = `<output_dir>/processamento.log`)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Append log lines to a file in addition to stdout
    #[serde(default = "default_true")]
    pub log_to_file: bool,

    /// Write log lines to stdout
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            workers: default_workers(),
            regions: default_regions(),
            progress_interval: default_progress_interval(),
            numbering_plan: true,
            carrier_table: None,
            output_naming: OutputNaming::Region,
            log_level: LogLevel::Info,
            log_file: None,
            log_to_file: true,
            log_to_stdout: true,
            verbose: false,
        }
    }
}

/// How output file names are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputNaming {
    /// `{region} - {bucket}.csv`; inputs sharing a region overwrite each other
    #[default]
    Region,

    /// `{region} - {source stem} - {bucket}.csv`
    RegionAndSource,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("cnpj_data/export")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("arquivos_finalizados")
}

fn default_workers() -> usize {
    6
}

fn default_regions() -> Vec<String> {
    ["AL", "BA", "CE", "MA", "PB", "PE", "PI", "RN", "SE"]
        .iter()
        .map(|uf| uf.to_string())
        .collect()
}

fn default_progress_interval() -> u64 {
    100_000
}

impl SplitConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SplitConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SplitError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that would make the run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(SplitError::Config(
                "progress_interval must be greater than zero".to_string(),
            ));
        }
        if self.regions.is_empty() {
            return Err(SplitError::Config(
                "at least one region must be configured".to_string(),
            ));
        }
        if let Some(bad) = self
            .regions
            .iter()
            .find(|r| r.len() != 2 || !r.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(SplitError::Config(format!(
                "region '{}' is not a 2-letter code",
                bad
            )));
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the available parallelism
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            get_cpu_count()
        } else {
            self.workers
        }
    }

    /// Log file to append to, if file logging is enabled
    pub fn effective_log_file(&self) -> Option<PathBuf> {
        if !self.log_to_file {
            return None;
        }
        Some(
            self.log_file
                .clone()
                .unwrap_or_else(|| self.output_dir.join(DEFAULT_LOG_FILE_NAME)),
        )
    }

    /// Region codes upper-cased, in configured order
    pub fn normalized_regions(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.trim().to_uppercase()).collect()
    }
}

fn get_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
