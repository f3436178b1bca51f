/*!
 * Progress event publisher for pipeline monitoring
 *
 * Workers publish file-level events (start, delimiter, row progress,
 * completion, failure) into a crossbeam channel. A single subscriber,
 * usually the console renderer, consumes them in arrival order.
 */

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use super::delimiter::Delimiter;

/// Progress event types
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A worker picked up a file
    FileStarted {
        source: PathBuf,
        region: String,
        timestamp: u64,
    },

    /// Delimiter chosen from the header line
    DelimiterDetected {
        region: String,
        delimiter: Delimiter,
        columns: usize,
        timestamp: u64,
    },

    /// Rows read so far for one file
    RowsProgress {
        region: String,
        rows: u64,
        timestamp: u64,
    },

    /// One bucket file could not be written
    BucketFailed {
        region: String,
        file_name: String,
        error: String,
        timestamp: u64,
    },

    /// File processed and exported
    FileCompleted {
        region: String,
        unique_records: u64,
        rows_seen: u64,
        files_written: u64,
        duration_ms: u64,
        timestamp: u64,
    },

    /// File aborted
    FileFailed {
        region: String,
        source: PathBuf,
        error: String,
        timestamp: u64,
    },

    /// Every file has been processed
    RunComplete {
        files_succeeded: u64,
        files_failed: u64,
        unique_records: u64,
        duration_ms: u64,
        timestamp: u64,
    },
}

impl ProgressEvent {
    pub(crate) fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Region the event refers to, if any
    pub fn region(&self) -> Option<&str> {
        match self {
            ProgressEvent::FileStarted { region, .. }
            | ProgressEvent::DelimiterDetected { region, .. }
            | ProgressEvent::RowsProgress { region, .. }
            | ProgressEvent::BucketFailed { region, .. }
            | ProgressEvent::FileCompleted { region, .. }
            | ProgressEvent::FileFailed { region, .. } => Some(region),
            ProgressEvent::RunComplete { .. } => None,
        }
    }
}

/// Progress publisher - sends events to subscribers
#[derive(Clone, Debug)]
pub struct ProgressPublisher {
    sender: Option<Sender<ProgressEvent>>,
}

impl ProgressPublisher {
    /// Create a new publisher with bounded channel
    pub fn new(buffer_size: usize) -> (Self, ProgressSubscriber) {
        let (tx, rx) = bounded(buffer_size);
        (
            ProgressPublisher { sender: Some(tx) },
            ProgressSubscriber { receiver: rx },
        )
    }

    /// Create a new publisher with unbounded channel
    pub fn unbounded() -> (Self, ProgressSubscriber) {
        let (tx, rx) = unbounded();
        (
            ProgressPublisher { sender: Some(tx) },
            ProgressSubscriber { receiver: rx },
        )
    }

    /// Create a no-op publisher (for when progress tracking is disabled)
    pub fn noop() -> Self {
        ProgressPublisher { sender: None }
    }

    /// Publish an event
    pub fn publish(&self, event: ProgressEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event); // Subscriber may have dropped
        }
    }

    pub fn file_started(&self, source: PathBuf, region: &str) {
        self.publish(ProgressEvent::FileStarted {
            source,
            region: region.to_string(),
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn delimiter_detected(&self, region: &str, delimiter: Delimiter, columns: usize) {
        self.publish(ProgressEvent::DelimiterDetected {
            region: region.to_string(),
            delimiter,
            columns,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn rows_progress(&self, region: &str, rows: u64) {
        self.publish(ProgressEvent::RowsProgress {
            region: region.to_string(),
            rows,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn bucket_failed(&self, region: &str, file_name: String, error: String) {
        self.publish(ProgressEvent::BucketFailed {
            region: region.to_string(),
            file_name,
            error,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn file_completed(
        &self,
        region: &str,
        unique_records: u64,
        rows_seen: u64,
        files_written: u64,
        duration_ms: u64,
    ) {
        self.publish(ProgressEvent::FileCompleted {
            region: region.to_string(),
            unique_records,
            rows_seen,
            files_written,
            duration_ms,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn file_failed(&self, region: &str, source: PathBuf, error: String) {
        self.publish(ProgressEvent::FileFailed {
            region: region.to_string(),
            source,
            error,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }

    pub fn run_complete(
        &self,
        files_succeeded: u64,
        files_failed: u64,
        unique_records: u64,
        duration_ms: u64,
    ) {
        self.publish(ProgressEvent::RunComplete {
            files_succeeded,
            files_failed,
            unique_records,
            duration_ms,
            timestamp: ProgressEvent::current_timestamp(),
        });
    }
}

/// Progress subscriber - receives events
pub struct ProgressSubscriber {
    receiver: Receiver<ProgressEvent>,
}

impl ProgressSubscriber {
    /// Get the receiver for consuming events
    pub fn receiver(&self) -> &Receiver<ProgressEvent> {
        &self.receiver
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Option<ProgressEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive an event (blocking); `None` once every publisher is dropped
    pub fn recv(&self) -> Option<ProgressEvent> {
        self.receiver.recv().ok()
    }

    /// Create an iterator over events
    pub fn iter(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.receiver.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_subscriber() {
        let (publisher, subscriber) = ProgressPublisher::new(10);

        publisher.file_started(PathBuf::from("/in/empresas_al.csv"), "AL");

        match subscriber.try_recv().unwrap() {
            ProgressEvent::FileStarted { source, region, .. } => {
                assert_eq!(source, PathBuf::from("/in/empresas_al.csv"));
                assert_eq!(region, "AL");
            }
            other => panic!("Expected FileStarted event, got {:?}", other),
        }
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = ProgressPublisher::noop();
        // Should not panic
        publisher.rows_progress("AL", 100_000);
        publisher.run_complete(1, 0, 10, 5);
    }

    #[test]
    fn test_event_sequence() {
        let (publisher, subscriber) = ProgressPublisher::unbounded();

        publisher.file_started(PathBuf::from("/in/al_2024.csv"), "AL");
        publisher.delimiter_detected("AL", Delimiter::Semicolon, 6);
        publisher.rows_progress("AL", 20);
        publisher.file_completed("AL", 14, 18, 2, 12);

        let events: Vec<_> = subscriber.receiver.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], ProgressEvent::FileStarted { .. }));
        assert!(matches!(
            events[1],
            ProgressEvent::DelimiterDetected {
                delimiter: Delimiter::Semicolon,
                columns: 6,
                ..
            }
        ));
        assert!(matches!(events[2], ProgressEvent::RowsProgress { rows: 20, .. }));
        assert!(matches!(
            events[3],
            ProgressEvent::FileCompleted {
                unique_records: 14,
                ..
            }
        ));
        assert!(events.iter().all(|e| e.region() == Some("AL")));
    }

    #[test]
    fn test_subscriber_ends_when_publishers_drop() {
        let (publisher, subscriber) = ProgressPublisher::unbounded();
        let worker = publisher.clone();
        let handle = std::thread::spawn(move || worker.rows_progress("BA", 1));
        handle.join().unwrap();
        drop(publisher);

        let events: Vec<_> = subscriber.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(subscriber.recv().is_none());
    }
}
