/*!
 * Run coordinator
 *
 * Fans source files out over a fixed-size rayon pool, waits for every
 * file task and folds the outcomes into [`RunStatistics`].
 */

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use super::carrier::{CarrierClassifier, NumberingPlan};
use super::discovery::SourceFile;
use super::numbering::{BrazilNumberingPlan, CarrierTable};
use super::pipeline::{process_file, PipelineContext};
use super::progress::ProgressPublisher;
use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::stats::{format_count, FileOutcome, RunReport, RunStatistics};

/// Build the carrier classifier described by `config`
pub fn build_classifier(config: &SplitConfig) -> Result<CarrierClassifier> {
    if !config.numbering_plan {
        info!("Numbering plan disabled; carrier heuristic only");
        return Ok(CarrierClassifier::heuristic_only());
    }

    let plan = match &config.carrier_table {
        Some(path) => BrazilNumberingPlan::with_carriers(CarrierTable::from_file(path)?),
        None => BrazilNumberingPlan::new(),
    };
    let plan: Arc<dyn NumberingPlan> = Arc::new(plan);
    Ok(CarrierClassifier::new(Some(plan)))
}

/// Create the output directory, failing the run when that is impossible
pub fn prepare_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| SplitError::OutputNotWritable {
        path: path.to_path_buf(),
        source,
    })?;

    let metadata = fs::metadata(path).map_err(|source| SplitError::OutputNotWritable {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.permissions().readonly() {
        return Err(SplitError::OutputNotWritable {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        });
    }
    Ok(())
}

/// Per-run result: aggregate report plus every file outcome in input order
#[derive(Debug)]
pub struct RunResult {
    pub report: RunReport,
    pub outcomes: Vec<FileOutcome>,
}

/// Process every source file and aggregate the results
pub fn run(
    config: &SplitConfig,
    sources: &[SourceFile],
    classifier: CarrierClassifier,
    publisher: ProgressPublisher,
) -> Result<RunResult> {
    if sources.is_empty() {
        return Err(SplitError::NoSourceFiles(config.input_dir.clone()));
    }
    prepare_output_dir(&config.output_dir)?;

    let workers = config.effective_workers().min(sources.len()).max(1);
    info!(
        files = sources.len(),
        workers,
        output = %config.output_dir.display(),
        "Starting run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("switchboard-worker-{}", i))
        .build()
        .map_err(|e| SplitError::WorkerPool(e.to_string()))?;

    let stats = RunStatistics::new();
    let ctx = PipelineContext::from_config(config, classifier, publisher.clone());
    let slots: Vec<Mutex<Option<FileOutcome>>> = sources.iter().map(|_| Mutex::new(None)).collect();

    pool.scope(|s| {
        for (source, slot) in sources.iter().zip(&slots) {
            let stats = stats.clone();
            let ctx = &ctx;
            s.spawn(move |_| {
                let outcome = process_file(source, ctx);
                stats.record_outcome(&outcome);
                if let Ok(mut slot) = slot.lock() {
                    *slot = Some(outcome);
                }
            });
        }
    });

    let outcomes: Vec<FileOutcome> = slots
        .into_iter()
        .filter_map(|slot| slot.into_inner().ok().flatten())
        .collect();

    let report = stats.report();
    log_report(&report, &outcomes);
    publisher.run_complete(
        report.files_succeeded,
        report.files_failed,
        report.unique_records,
        report.elapsed_ms,
    );

    Ok(RunResult { report, outcomes })
}

fn log_report(report: &RunReport, outcomes: &[FileOutcome]) {
    for outcome in outcomes {
        if let Err(failure) = &outcome.status {
            error!(
                file = %outcome.file_name(),
                stage = %failure.stage,
                category = %failure.category,
                "Failed: {}",
                failure.message
            );
        }
    }

    info!("Run finished");
    for line in report.format_summary().lines() {
        info!("{}", line);
    }
    info!(
        unique = %format_count(report.unique_records),
        rows = %format_count(report.rows_seen),
        "Totals"
    );
}
