/*!
 * Carrier buckets and per-bucket CSV export
 */

use std::fmt;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use tracing::{debug, error};

use super::carrier::CarrierLabel;
use super::record::{Record, RECORD_HEADER};
use crate::config::OutputNaming;
use crate::error::Result;

/// Output bucket; one file per non-empty bucket and region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorBucket {
    Claro,
    Vivo,
    Tim,
    Oi,
    Fixo,
    SemOperadora,
}

impl OperatorBucket {
    /// Buckets in export order
    pub const ALL: [OperatorBucket; 6] = [
        OperatorBucket::Claro,
        OperatorBucket::Vivo,
        OperatorBucket::Tim,
        OperatorBucket::Oi,
        OperatorBucket::Fixo,
        OperatorBucket::SemOperadora,
    ];

    /// Bucket for a classified label. Operators outside the four majors
    /// share the catch-all bucket.
    pub fn from_label(label: &CarrierLabel) -> Self {
        match label {
            CarrierLabel::Claro => OperatorBucket::Claro,
            CarrierLabel::Vivo => OperatorBucket::Vivo,
            CarrierLabel::Tim => OperatorBucket::Tim,
            CarrierLabel::Oi => OperatorBucket::Oi,
            CarrierLabel::Fixo => OperatorBucket::Fixo,
            CarrierLabel::Other(_) | CarrierLabel::NoCarrier => OperatorBucket::SemOperadora,
        }
    }

    /// Form used in output file names
    pub fn file_label(self) -> &'static str {
        match self {
            OperatorBucket::Claro => "CLARO",
            OperatorBucket::Vivo => "VIVO",
            OperatorBucket::Tim => "TIM",
            OperatorBucket::Oi => "OI",
            OperatorBucket::Fixo => "FIXO",
            OperatorBucket::SemOperadora => "SEM_OPERADORA",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OperatorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorBucket::SemOperadora => write!(f, "SEM OPERADORA"),
            other => write!(f, "{}", other.file_label()),
        }
    }
}

/// Records of one file grouped by bucket, insertion order preserved
#[derive(Debug, Default)]
pub struct Buckets {
    records: [Vec<Record>; 6],
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bucket: OperatorBucket, record: Record) {
        self.records[bucket.index()].push(record);
    }

    pub fn get(&self, bucket: OperatorBucket) -> &[Record] {
        &self.records[bucket.index()]
    }

    pub fn total(&self) -> usize {
        self.records.iter().map(Vec::len).sum()
    }

    /// Record count per bucket, in export order
    pub fn distribution(&self) -> Distribution {
        Distribution(OperatorBucket::ALL.map(|b| (b, self.get(b).len())))
    }
}

/// Per-bucket record counts of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution(pub [(OperatorBucket, usize); 6]);

impl Distribution {
    pub fn count(&self, bucket: OperatorBucket) -> usize {
        self.0[bucket.index()].1
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (bucket, count)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", bucket, count)?;
        }
        Ok(())
    }
}

/// Where and under which names one file's buckets are written
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub output_dir: PathBuf,
    pub region: String,
    pub source_stem: String,
    pub naming: OutputNaming,
}

impl ExportTarget {
    pub fn file_name(&self, bucket: OperatorBucket) -> String {
        match self.naming {
            OutputNaming::Region => format!("{} - {}.csv", self.region, bucket.file_label()),
            OutputNaming::RegionAndSource => format!(
                "{} - {} - {}.csv",
                self.region,
                self.source_stem,
                bucket.file_label()
            ),
        }
    }

    pub fn path(&self, bucket: OperatorBucket) -> PathBuf {
        self.output_dir.join(self.file_name(bucket))
    }
}

/// A bucket whose file could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub files_written: u64,
    pub failures: Vec<BucketFailure>,
}

/// Write one `;`-delimited, unquoted file with the fixed header
pub fn write_bucket(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Never)
        .from_path(path)?;

    writer.write_record(RECORD_HEADER)?;
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every non-empty bucket. A failing bucket is logged and recorded;
/// the remaining buckets are still written.
pub fn export_buckets(buckets: &Buckets, target: &ExportTarget) -> ExportSummary {
    let mut summary = ExportSummary::default();

    for bucket in OperatorBucket::ALL {
        let records = buckets.get(bucket);
        if records.is_empty() {
            continue;
        }

        let file_name = target.file_name(bucket);
        match write_bucket(&target.output_dir.join(&file_name), records) {
            Ok(()) => {
                debug!(file = %file_name, records = records.len(), "Bucket written");
                summary.files_written += 1;
            }
            Err(e) => {
                error!(file = %file_name, error = %e, "Failed to write bucket");
                summary.failures.push(BucketFailure {
                    file_name,
                    error: e.to_string(),
                });
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RecordValidator, RowVerdict};
    use std::fs;
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> Record {
        let mut validator = RecordValidator::new();
        match validator.validate(&[id, name, "RUA A", "a@b.com", "1999", "(82) 3311-1200"]) {
            RowVerdict::Accepted(r) => r,
            other => panic!("Expected accepted row, got {:?}", other),
        }
    }

    fn target(dir: &Path, naming: OutputNaming) -> ExportTarget {
        ExportTarget {
            output_dir: dir.to_path_buf(),
            region: "AL".to_string(),
            source_stem: "ativos_al".to_string(),
            naming,
        }
    }

    #[test]
    fn test_bucket_from_label() {
        assert_eq!(OperatorBucket::from_label(&CarrierLabel::Claro), OperatorBucket::Claro);
        assert_eq!(OperatorBucket::from_label(&CarrierLabel::Fixo), OperatorBucket::Fixo);
        assert_eq!(
            OperatorBucket::from_label(&CarrierLabel::Other("NEXTEL".into())),
            OperatorBucket::SemOperadora
        );
        assert_eq!(
            OperatorBucket::from_label(&CarrierLabel::NoCarrier),
            OperatorBucket::SemOperadora
        );
    }

    #[test]
    fn test_file_names() {
        let t = target(Path::new("/out"), OutputNaming::Region);
        assert_eq!(t.file_name(OperatorBucket::SemOperadora), "AL - SEM_OPERADORA.csv");
        assert_eq!(t.file_name(OperatorBucket::Vivo), "AL - VIVO.csv");

        let t = target(Path::new("/out"), OutputNaming::RegionAndSource);
        assert_eq!(t.file_name(OperatorBucket::Tim), "AL - ativos_al - TIM.csv");
    }

    #[test]
    fn test_empty_buckets_produce_no_files() {
        let dir = TempDir::new().unwrap();
        let summary = export_buckets(&Buckets::new(), &target(dir.path(), OutputNaming::Region));
        assert_eq!(summary.files_written, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_header_and_insertion_order() {
        let dir = TempDir::new().unwrap();
        let mut buckets = Buckets::new();
        buckets.push(OperatorBucket::Fixo, record("22222222000122", "SEGUNDA"));
        buckets.push(OperatorBucket::Fixo, record("11111111000111", "PRIMEIRA"));

        let summary = export_buckets(&buckets, &target(dir.path(), OutputNaming::Region));
        assert_eq!(summary.files_written, 1);
        assert!(summary.failures.is_empty());

        let contents = fs::read_to_string(dir.path().join("AL - FIXO.csv")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "cnpj_completo;razao_social;endereco_completo;email;ano_abertura;telefones"
        );
        assert_eq!(lines[1], "22222222000122;SEGUNDA;RUA A;a@b.com;1999;(82) 3311-1200");
        assert_eq!(lines[2], "11111111000111;PRIMEIRA;RUA A;a@b.com;1999;(82) 3311-1200");
        assert_eq!(lines.len(), 3);
        assert!(!dir.path().join("AL - VIVO.csv").exists());
    }

    #[test]
    fn test_fields_are_never_quoted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_bucket(&path, &[record("11111111000111", "ACME \"X\", LTDA")]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("11111111000111;ACME \"X\", LTDA;"));
    }

    #[test]
    fn test_failed_bucket_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        // A directory squatting on the CLARO file name makes that write fail
        fs::create_dir(dir.path().join("AL - CLARO.csv")).unwrap();

        let mut buckets = Buckets::new();
        buckets.push(OperatorBucket::Claro, record("11111111000111", "A"));
        buckets.push(OperatorBucket::Vivo, record("22222222000122", "B"));
        buckets.push(OperatorBucket::SemOperadora, record("33333333000133", "C"));

        let summary = export_buckets(&buckets, &target(dir.path(), OutputNaming::Region));
        assert_eq!(summary.files_written, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].file_name, "AL - CLARO.csv");
        assert!(dir.path().join("AL - VIVO.csv").is_file());
        assert!(dir.path().join("AL - SEM_OPERADORA.csv").is_file());
    }

    #[test]
    fn test_distribution_display() {
        let mut buckets = Buckets::new();
        buckets.push(OperatorBucket::Vivo, record("11111111000111", "A"));
        buckets.push(OperatorBucket::Vivo, record("22222222000122", "B"));
        buckets.push(OperatorBucket::SemOperadora, record("33333333000133", "C"));

        let distribution = buckets.distribution();
        assert_eq!(distribution.count(OperatorBucket::Vivo), 2);
        assert_eq!(buckets.total(), 3);
        assert_eq!(
            distribution.to_string(),
            "CLARO: 0, VIVO: 2, TIM: 0, OI: 0, FIXO: 0, SEM OPERADORA: 1"
        );
    }
}
