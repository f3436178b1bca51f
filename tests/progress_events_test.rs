use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;

use switchboard::config::{OutputNaming, SplitConfig};
use switchboard::core::pipeline::{process_file, PipelineContext};
use switchboard::core::progress::{ProgressEvent, ProgressPublisher};
use switchboard::core::{discover_sources, run, CarrierClassifier, Delimiter, SourceFile};
use tempfile::TempDir;

#[test]
fn test_progress_events_single_file() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("empresas_pb.csv");
    let output = temp.path().join("saida");

    // 250 rows, tab separated
    let mut body = String::from("cnpj\trazao\tendereco\temail\tano\ttelefones\n");
    for n in 0..250u32 {
        body.push_str(&format!(
            "{:014}\tEMPRESA {}\tRUA\t\t2001\t(83) 9{:04}-{:04}\n",
            n + 1,
            n,
            8000 + n,
            n
        ));
    }
    fs::write(&source, body).unwrap();

    // Create publisher/subscriber
    let (publisher, subscriber) = ProgressPublisher::unbounded();

    // Collect events in background thread
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let handle = thread::spawn(move || {
        for event in subscriber.receiver().iter() {
            events_clone.lock().unwrap().push(event);
        }
    });

    let ctx = PipelineContext {
        output_dir: output.clone(),
        naming: OutputNaming::Region,
        progress_interval: 100,
        classifier: CarrierClassifier::heuristic_only(),
        publisher,
    };
    let outcome = process_file(&SourceFile::new(&source, "PB"), &ctx);
    assert!(outcome.is_success(), "File should be processed");

    // Drop publisher to signal completion
    drop(ctx);
    handle.join().unwrap();

    let collected_events = events.lock().unwrap();
    println!("Collected {} events", collected_events.len());

    assert!(matches!(
        collected_events.first(),
        Some(ProgressEvent::FileStarted { region, .. }) if region == "PB"
    ));
    assert!(collected_events.iter().any(|e| matches!(
        e,
        ProgressEvent::DelimiterDetected {
            delimiter: Delimiter::Tab,
            columns: 6,
            ..
        }
    )));

    let rows: Vec<u64> = collected_events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::RowsProgress { rows, .. } => Some(*rows),
            _ => None,
        })
        .collect();
    assert_eq!(rows, vec![100, 200, 250]);

    match collected_events.last() {
        Some(ProgressEvent::FileCompleted {
            unique_records,
            rows_seen,
            files_written,
            ..
        }) => {
            assert_eq!(*unique_records, 250);
            assert_eq!(*rows_seen, 250);
            assert_eq!(*files_written, 1);
        }
        other => panic!("Expected FileCompleted last, got {:?}", other),
    }

    assert!(output.join("PB - VIVO.csv").is_file());
}

#[test]
fn test_progress_events_whole_run() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    for uf in ["ma", "pi", "rn"] {
        fs::write(
            input.path().join(format!("ativos_{}.csv", uf)),
            "cnpj,razao,endereco,email,ano,telefones\n\
             11111111000111,A,RUA,a@a,2001,(86) 3222-1000\n",
        )
        .unwrap();
    }
    fs::write(input.path().join("ativos_se.csv"), "").unwrap();

    let config = SplitConfig {
        input_dir: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        workers: 3,
        log_to_file: false,
        log_to_stdout: false,
        ..SplitConfig::default()
    };
    let sources = discover_sources(input.path(), &config.normalized_regions()).unwrap();
    assert_eq!(sources.len(), 4);

    let (publisher, subscriber) = ProgressPublisher::unbounded();
    let handle = thread::spawn(move || subscriber.iter().collect::<Vec<_>>());

    let result = run(
        &config,
        &sources,
        CarrierClassifier::heuristic_only(),
        publisher,
    )
    .unwrap();
    let collected_events = handle.join().unwrap();

    let started = collected_events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::FileStarted { .. }))
        .count();
    let completed = collected_events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::FileCompleted { .. }))
        .count();
    let failed: Vec<&str> = collected_events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::FileFailed { region, .. } => Some(region.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(started, 4);
    assert_eq!(completed, 3);
    assert_eq!(failed, vec!["SE"]);
    assert_eq!(result.report.files_failed, 1);

    // RunComplete is published once, after every file event
    let run_complete: Vec<usize> = collected_events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ProgressEvent::RunComplete { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(run_complete, vec![collected_events.len() - 1]);
}
