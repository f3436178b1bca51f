/*!
 * Per-file pipeline: delimiter detection, row streaming, classification
 * and export
 *
 * ```text
 * Start -> DetectDelimiter -> StreamRows -> Export -> Done
 *               |                 |           |
 *               +-----------------+-----------+--> Failed
 * ```
 *
 * A file task never returns an error to its caller. Whatever goes wrong
 * is logged with the file name and recorded in the returned
 * [`FileOutcome`].
 */

use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, error, info};

use super::carrier::CarrierClassifier;
use super::delimiter::{detect_file_delimiter, Delimiter};
use super::discovery::SourceFile;
use super::export::{export_buckets, Buckets, ExportTarget, OperatorBucket};
use super::latin1::decode_latin1;
use super::phone::normalize_first_phone;
use super::progress::ProgressPublisher;
use super::record::{RecordValidator, RowVerdict, RECORD_FIELDS};
use crate::config::{OutputNaming, SplitConfig};
use crate::error::Result;
use crate::stats::{format_count, format_duration, FileFailure, FileOutcome};

/// Data rows logged as diagnostic samples at the start of each file
pub const SAMPLE_ROWS: u64 = 5;

/// Stage of a file task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    DetectDelimiter,
    StreamRows,
    Export,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::DetectDelimiter => "detect-delimiter",
            PipelineStage::StreamRows => "stream-rows",
            PipelineStage::Export => "export",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a file task needs besides the file itself
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub output_dir: PathBuf,
    pub naming: OutputNaming,
    pub progress_interval: u64,
    pub classifier: CarrierClassifier,
    pub publisher: ProgressPublisher,
}

impl PipelineContext {
    pub fn from_config(
        config: &SplitConfig,
        classifier: CarrierClassifier,
        publisher: ProgressPublisher,
    ) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            naming: config.output_naming,
            progress_interval: config.progress_interval.max(1),
            classifier,
            publisher,
        }
    }
}

/// Process one source file end to end
pub fn process_file(source: &SourceFile, ctx: &PipelineContext) -> FileOutcome {
    let started = Instant::now();
    let file_name = source.file_name();
    let mut outcome = FileOutcome::new(source);
    let mut stage = PipelineStage::Start;

    info!(file = %file_name, region = %source.region, "Processing file");
    ctx.publisher.file_started(source.path.clone(), &source.region);

    let result = run_stages(source, ctx, &mut outcome, &mut stage);
    outcome.duration = started.elapsed();

    match result {
        Ok(()) => {
            info!(
                file = %file_name,
                region = %source.region,
                "✓ {} - {} unique records from {} rows ({} files) in {}",
                source.region,
                format_count(outcome.unique_records),
                format_count(outcome.rows_seen),
                outcome.files_written,
                format_duration(outcome.duration)
            );
            ctx.publisher.file_completed(
                &source.region,
                outcome.unique_records,
                outcome.rows_seen,
                outcome.files_written,
                outcome.duration.as_millis() as u64,
            );
        }
        Err(e) => {
            error!(
                file = %file_name,
                region = %source.region,
                stage = %stage,
                error = %e,
                "File processing failed"
            );
            outcome.status = Err(FileFailure::new(stage.to_string(), &e));
            stage = PipelineStage::Failed;
            ctx.publisher
                .file_failed(&source.region, source.path.clone(), e.to_string());
        }
    }

    debug!(file = %file_name, stage = %stage, "File task finished");
    outcome
}

fn run_stages(
    source: &SourceFile,
    ctx: &PipelineContext,
    outcome: &mut FileOutcome,
    stage: &mut PipelineStage,
) -> Result<()> {
    *stage = PipelineStage::DetectDelimiter;
    let choice = detect_file_delimiter(&source.path)?;
    outcome.delimiter = Some(choice.delimiter);
    ctx.publisher
        .delimiter_detected(&source.region, choice.delimiter, choice.columns);

    *stage = PipelineStage::StreamRows;
    let (validator, buckets) = stream_rows(source, choice.delimiter, ctx, outcome)?;
    outcome.rows_seen = validator.rows_seen();
    outcome.rows_malformed = validator.rows_malformed();
    outcome.invalid_identifiers = validator.invalid_identifiers();
    outcome.duplicates = validator.duplicates();
    outcome.unique_records = validator.unique_records();
    drop(validator);

    *stage = PipelineStage::Export;
    fs::create_dir_all(&ctx.output_dir)?;
    let target = ExportTarget {
        output_dir: ctx.output_dir.clone(),
        region: source.region.clone(),
        source_stem: source.stem(),
        naming: ctx.naming,
    };
    let summary = export_buckets(&buckets, &target);
    for failure in &summary.failures {
        ctx.publisher.bucket_failed(
            &source.region,
            failure.file_name.clone(),
            failure.error.clone(),
        );
    }

    let distribution = buckets.distribution();
    info!(
        file = %source.file_name(),
        region = %source.region,
        "Distribution: {}",
        distribution
    );
    outcome.distribution = Some(distribution);
    outcome.files_written = summary.files_written;
    outcome.bucket_failures = summary.failures;

    *stage = PipelineStage::Done;
    Ok(())
}

/// Read every data row, keep valid unique records and bucket them by carrier
fn stream_rows(
    source: &SourceFile,
    delimiter: Delimiter,
    ctx: &PipelineContext,
    outcome: &mut FileOutcome,
) -> Result<(RecordValidator, Buckets)> {
    let file = File::open(&source.path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut validator = RecordValidator::new();
    let mut buckets = Buckets::new();
    let mut raw = ByteRecord::new();
    let mut rows: u64 = 0;

    while reader.read_byte_record(&mut raw)? {
        rows += 1;
        let fields: Vec<_> = raw.iter().take(RECORD_FIELDS).map(decode_latin1).collect();

        if rows <= SAMPLE_ROWS {
            debug!(
                region = %source.region,
                row = rows,
                identifier = %fields.first().map_or("", |f| f.as_ref()),
                phone = %fields.get(5).map_or("", |f| f.as_ref()),
                "Sample row"
            );
        }

        if let RowVerdict::Accepted(record) = validator.validate(&fields) {
            let phone = normalize_first_phone(record.phone_text());
            let label = ctx.classifier.classify(&phone);
            buckets.push(OperatorBucket::from_label(&label), record);
        }

        if rows % ctx.progress_interval == 0 {
            info!(region = %source.region, "Progress: {} rows read", format_count(rows));
            ctx.publisher.rows_progress(&source.region, rows);
        }
    }

    outcome.rows_read = rows;
    ctx.publisher.rows_progress(&source.region, rows);
    Ok((validator, buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::ProgressEvent;
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: &str = "cnpj;razao;endereco;email;ano;telefones\n";

    fn context(out: &Path, publisher: ProgressPublisher) -> PipelineContext {
        PipelineContext {
            output_dir: out.to_path_buf(),
            naming: OutputNaming::Region,
            progress_interval: 2,
            classifier: CarrierClassifier::heuristic_only(),
            publisher,
        }
    }

    fn write_source(dir: &Path, name: &str, body: &str) -> SourceFile {
        let path = dir.join(name);
        fs::write(&path, format!("{}{}", HEADER, body)).unwrap();
        SourceFile::new(path, "AL")
    }

    #[test]
    fn test_process_file_buckets_and_counts() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = write_source(
            input.path(),
            "al_ativos.csv",
            "11111111000111;A;RUA;a@a;2001;(82) 98888-7777\n\
             22222222000122;B;RUA;b@b;2002;(82) 3311-1200\n\
             11111111000111;DUP;RUA;c@c;2003;(82) 98888-7777\n\
             123;BAD;RUA;d@d;2004;(82) 98888-7777\n\
             33333333000133;C\n",
        );

        let (publisher, subscriber) = ProgressPublisher::unbounded();
        let outcome = process_file(&source, &context(output.path(), publisher));

        assert!(outcome.is_success());
        assert_eq!(outcome.delimiter, Some(Delimiter::Semicolon));
        assert_eq!(outcome.rows_read, 5);
        assert_eq!(outcome.rows_seen, 4);
        assert_eq!(outcome.rows_malformed, 1);
        assert_eq!(outcome.invalid_identifiers, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.unique_records, 2);
        assert_eq!(outcome.files_written, 2);

        let distribution = outcome.distribution.unwrap();
        assert_eq!(distribution.count(OperatorBucket::Vivo), 1);
        assert_eq!(distribution.count(OperatorBucket::SemOperadora), 1);
        assert!(output.path().join("AL - VIVO.csv").is_file());
        assert!(output.path().join("AL - SEM_OPERADORA.csv").is_file());

        let progress: Vec<u64> = subscriber
            .receiver()
            .try_iter()
            .filter_map(|e| match e {
                ProgressEvent::RowsProgress { rows, .. } => Some(rows),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![2, 4, 5]);
    }

    #[test]
    fn test_latin1_fields_survive() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = input.path().join("al_ativos.csv");
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"11111111000111;JO\xc3O;RUA;a@a;2001;(82) 3311-1200\n");
        fs::write(&path, bytes).unwrap();

        let outcome = process_file(
            &SourceFile::new(path, "AL"),
            &context(output.path(), ProgressPublisher::noop()),
        );
        assert!(outcome.is_success());

        let written = fs::read_to_string(output.path().join("AL - SEM_OPERADORA.csv")).unwrap();
        assert!(written.contains("11111111000111;JOÃO;RUA"));
    }

    #[test]
    fn test_empty_file_fails_at_detection() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = input.path().join("al_vazio.csv");
        fs::write(&path, "").unwrap();

        let (publisher, subscriber) = ProgressPublisher::unbounded();
        let outcome = process_file(&SourceFile::new(path, "AL"), &context(output.path(), publisher));

        let failure = outcome.status.unwrap_err();
        assert_eq!(failure.stage, "detect-delimiter");
        assert_eq!(failure.category, "validation");
        assert_eq!(outcome.files_written, 0);
        assert!(subscriber
            .receiver()
            .try_iter()
            .any(|e| matches!(e, ProgressEvent::FileFailed { .. })));
    }

    #[test]
    fn test_header_only_file_succeeds_without_output() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = write_source(input.path(), "al_ativos.csv", "");

        let outcome = process_file(&source, &context(output.path(), ProgressPublisher::noop()));
        assert!(outcome.is_success());
        assert_eq!(outcome.unique_records, 0);
        assert_eq!(outcome.files_written, 0);
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::StreamRows.to_string(), "stream-rows");
        assert_eq!(PipelineStage::Failed.to_string(), "failed");
    }
}
