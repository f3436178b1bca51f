/*!
 * Run statistics, per-file outcomes and the final report
 */

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::delimiter::Delimiter;
use crate::core::discovery::SourceFile;
use crate::core::export::{BucketFailure, Distribution};
use crate::error::{SplitError, EXIT_PARTIAL, EXIT_SUCCESS};

/// Why a file task ended early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Pipeline stage that failed
    pub stage: String,
    pub category: String,
    pub message: String,
}

impl FileFailure {
    pub fn new(stage: impl Into<String>, error: &SplitError) -> Self {
        Self {
            stage: stage.into(),
            category: error.category().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result of processing one source file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub region: String,
    pub delimiter: Option<Delimiter>,
    /// Data rows read, malformed ones included
    pub rows_read: u64,
    /// Data rows with at least six fields
    pub rows_seen: u64,
    pub rows_malformed: u64,
    pub invalid_identifiers: u64,
    pub duplicates: u64,
    pub unique_records: u64,
    pub distribution: Option<Distribution>,
    pub files_written: u64,
    pub bucket_failures: Vec<BucketFailure>,
    pub duration: Duration,
    pub status: Result<(), FileFailure>,
}

impl FileOutcome {
    /// Empty successful outcome for `source`, filled in by the pipeline
    pub fn new(source: &SourceFile) -> Self {
        Self {
            source: source.path.clone(),
            region: source.region.clone(),
            delimiter: None,
            rows_read: 0,
            rows_seen: 0,
            rows_malformed: 0,
            invalid_identifiers: 0,
            duplicates: 0,
            unique_records: 0,
            distribution: None,
            files_written: 0,
            bucket_failures: Vec::new(),
            duration: Duration::ZERO,
            status: Ok(()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Thread-safe run counters shared by all workers
#[derive(Debug, Clone)]
pub struct RunStatistics {
    inner: Arc<RunStatisticsInner>,
}

#[derive(Debug)]
struct RunStatisticsInner {
    files_succeeded: AtomicU64,
    files_failed: AtomicU64,
    unique_records: AtomicU64,
    rows_seen: AtomicU64,
    output_files: AtomicU64,
    bucket_failures: AtomicU64,

    started: Instant,
    started_at: DateTime<Local>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RunStatisticsInner {
                files_succeeded: AtomicU64::new(0),
                files_failed: AtomicU64::new(0),
                unique_records: AtomicU64::new(0),
                rows_seen: AtomicU64::new(0),
                output_files: AtomicU64::new(0),
                bucket_failures: AtomicU64::new(0),
                started: Instant::now(),
                started_at: Local::now(),
            }),
        }
    }

    /// Fold one file outcome into the counters. Record counts of a failed
    /// file are not added.
    pub fn record_outcome(&self, outcome: &FileOutcome) {
        let inner = &self.inner;
        if outcome.is_success() {
            inner.files_succeeded.fetch_add(1, Ordering::Relaxed);
            inner
                .unique_records
                .fetch_add(outcome.unique_records, Ordering::Relaxed);
            inner.rows_seen.fetch_add(outcome.rows_seen, Ordering::Relaxed);
        } else {
            inner.files_failed.fetch_add(1, Ordering::Relaxed);
        }

        inner
            .output_files
            .fetch_add(outcome.files_written, Ordering::Relaxed);
        inner
            .bucket_failures
            .fetch_add(outcome.bucket_failures.len() as u64, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Snapshot of the counters, read once all workers have finished
    pub fn report(&self) -> RunReport {
        let inner = &self.inner;
        let files_succeeded = inner.files_succeeded.load(Ordering::Relaxed);
        let files_failed = inner.files_failed.load(Ordering::Relaxed);
        let elapsed = self.elapsed();

        RunReport {
            files_total: files_succeeded + files_failed,
            files_succeeded,
            files_failed,
            unique_records: inner.unique_records.load(Ordering::Relaxed),
            rows_seen: inner.rows_seen.load(Ordering::Relaxed),
            output_files: inner.output_files.load(Ordering::Relaxed),
            bucket_failures: inner.bucket_failures.load(Ordering::Relaxed),
            elapsed_ms: elapsed.as_millis() as u64,
            started_at: inner.started_at,
            finished_at: Local::now(),
        }
    }
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable end-of-run summary
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub files_total: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    pub unique_records: u64,
    pub rows_seen: u64,
    pub output_files: u64,
    pub bucket_failures: u64,
    pub elapsed_ms: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunReport {
    /// Succeeded files as a percentage of all files
    pub fn success_rate(&self) -> f64 {
        if self.files_total == 0 {
            0.0
        } else {
            (self.files_succeeded as f64 / self.files_total as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// 0 when every file succeeded, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.files_failed == 0 {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        }
    }

    /// Format the report as human-readable lines
    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Duration: {}\n\
             Files processed: {}/{}\n\
             Unique records: {}\n\
             CSV files written: {}\n\
             Success rate: {:.1}%",
            format_duration(self.elapsed()),
            self.files_succeeded,
            self.files_total,
            format_count(self.unique_records),
            format_count(self.output_files),
            self.success_rate(),
        );
        if self.bucket_failures > 0 {
            summary.push_str(&format!("\nBucket write failures: {}", self.bucket_failures));
        }
        summary
    }
}

/// Integer with `.` thousands separators (pt-BR)
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Duration as `HH:MM:SS`; hours are not wrapped at 24
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn outcome(unique: u64, files_written: u64) -> FileOutcome {
        let mut outcome = FileOutcome::new(&SourceFile::new("/in/al_ativos.csv", "AL"));
        outcome.unique_records = unique;
        outcome.rows_seen = unique + 2;
        outcome.files_written = files_written;
        outcome
    }

    fn failed() -> FileOutcome {
        let mut outcome = outcome(0, 0);
        outcome.status = Err(FileFailure::new(
            "detect-delimiter",
            &SplitError::EmptyInput(Path::new("/in/al_ativos.csv").to_path_buf()),
        ));
        outcome
    }

    #[test]
    fn test_record_outcomes() {
        let stats = RunStatistics::new();
        stats.record_outcome(&outcome(14, 2));
        stats.record_outcome(&outcome(6, 1));
        stats.record_outcome(&failed());

        let report = stats.report();
        assert_eq!(report.files_total, 3);
        assert_eq!(report.files_succeeded, 2);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.unique_records, 20);
        assert_eq!(report.rows_seen, 24);
        assert_eq!(report.output_files, 3);
        assert_eq!(report.exit_code(), EXIT_PARTIAL);
        assert!((report.success_rate() - 66.67).abs() < 0.1);
    }

    #[test]
    fn test_bucket_failures_counted() {
        let stats = RunStatistics::new();
        let mut o = outcome(3, 1);
        o.bucket_failures.push(BucketFailure {
            file_name: "AL - CLARO.csv".to_string(),
            error: "denied".to_string(),
        });
        stats.record_outcome(&o);

        let report = stats.report();
        assert_eq!(report.bucket_failures, 1);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        assert!(report.format_summary().contains("Bucket write failures: 1"));
    }

    #[test]
    fn test_empty_report() {
        let report = RunStatistics::new().report();
        assert_eq!(report.files_total, 0);
        assert_eq!(report.success_rate(), 0.0);
    }

    #[test]
    fn test_thread_safety() {
        use std::thread;

        let stats = RunStatistics::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_outcome(&outcome(10, 1));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let report = stats.report();
        assert_eq!(report.files_succeeded, 400);
        assert_eq!(report.unique_records, 4_000);
        assert_eq!(report.output_files, 400);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.000");
        assert_eq!(format_count(100_000), "100.000");
        assert_eq!(format_count(1_234_567), "1.234.567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_duration(Duration::from_secs(90_000)), "25:00:00");
    }

    #[test]
    fn test_summary_lines() {
        let stats = RunStatistics::new();
        stats.record_outcome(&outcome(1_500, 2));
        let summary = stats.report().format_summary();
        assert!(summary.contains("Files processed: 1/1"));
        assert!(summary.contains("Unique records: 1.500"));
        assert!(summary.contains("Success rate: 100.0%"));
    }

    #[test]
    fn test_report_serializes() {
        let stats = RunStatistics::new();
        stats.record_outcome(&outcome(5, 1));
        let json = serde_json::to_value(stats.report()).unwrap();
        assert_eq!(json["unique_records"], 5);
        assert_eq!(json["files_succeeded"], 1);
        assert!(json["started_at"].is_string());
    }
}
