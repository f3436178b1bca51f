/*!
 * CLI progress renderer for interactive terminal display
 *
 * Subscribes to pipeline events and keeps a single status line with the
 * rows read per region, finishing with a one-line run summary.
 */

use crate::core::progress::{ProgressEvent, ProgressSubscriber};
use crate::stats::{format_count, format_duration};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Display state of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionState {
    Running { rows: u64 },
    Done { unique: u64 },
    Failed,
}

impl RegionState {
    fn render(&self, region: &str) -> String {
        match self {
            RegionState::Running { rows } => format!("{} {}", region, format_count(*rows)),
            RegionState::Done { unique } => format!("{} ✓ {}", region, format_count(*unique)),
            RegionState::Failed => format!("{} ✗", region),
        }
    }
}

/// CLI progress renderer
pub struct CliProgressRenderer<W: Write + Send + 'static = io::Stderr> {
    subscriber: ProgressSubscriber,
    regions: BTreeMap<String, RegionState>,
    out: W,
    verbose: bool,
}

impl CliProgressRenderer<io::Stderr> {
    /// Create a renderer drawing on stderr
    pub fn new(subscriber: ProgressSubscriber, verbose: bool) -> Self {
        Self::with_writer(subscriber, io::stderr(), verbose)
    }
}

impl<W: Write + Send + 'static> CliProgressRenderer<W> {
    pub fn with_writer(subscriber: ProgressSubscriber, out: W, verbose: bool) -> Self {
        Self {
            subscriber,
            regions: BTreeMap::new(),
            out,
            verbose,
        }
    }

    /// Run the renderer in the current thread until every publisher is gone
    pub fn run(mut self) -> io::Result<W> {
        while let Some(event) = self.subscriber.recv() {
            self.handle_event(event)?;
        }
        Ok(self.out)
    }

    /// Spawn the renderer in a background thread
    pub fn spawn(self) -> thread::JoinHandle<io::Result<W>> {
        thread::spawn(move || self.run())
    }

    fn handle_event(&mut self, event: ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::FileStarted { region, .. } => {
                self.regions.insert(region, RegionState::Running { rows: 0 });
                self.draw_status()?;
            }

            ProgressEvent::DelimiterDetected { region, delimiter, columns, .. } => {
                if self.verbose {
                    self.print_line(&format!(
                        "[{}] delimiter {} ({} columns)",
                        region, delimiter, columns
                    ))?;
                }
            }

            ProgressEvent::RowsProgress { region, rows, .. } => {
                self.regions.insert(region, RegionState::Running { rows });
                self.draw_status()?;
            }

            ProgressEvent::BucketFailed { region, file_name, error, .. } => {
                self.print_line(&format!("[{}] ✗ {}: {}", region, file_name, error))?;
            }

            ProgressEvent::FileCompleted { region, unique_records, files_written, .. } => {
                self.regions
                    .insert(region.clone(), RegionState::Done { unique: unique_records });
                if self.verbose {
                    self.print_line(&format!(
                        "[{}] ✓ {} unique records, {} files",
                        region,
                        format_count(unique_records),
                        files_written
                    ))?;
                }
                self.draw_status()?;
            }

            ProgressEvent::FileFailed { region, error, .. } => {
                self.regions.insert(region.clone(), RegionState::Failed);
                self.print_line(&format!("[{}] ✗ {}", region, error))?;
            }

            ProgressEvent::RunComplete {
                files_succeeded,
                files_failed,
                unique_records,
                duration_ms,
                ..
            } => {
                self.draw_status()?;
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "{} files ok, {} failed, {} unique records in {}",
                    files_succeeded,
                    files_failed,
                    format_count(unique_records),
                    format_duration(Duration::from_millis(duration_ms))
                )?;
                self.out.flush()?;
            }
        }

        Ok(())
    }

    fn status_line(&self) -> String {
        self.regions
            .iter()
            .map(|(region, state)| state.render(region))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn draw_status(&mut self) -> io::Result<()> {
        let line = self.status_line();
        write!(self.out, "\r{}", line)?;
        self.out.flush()
    }

    /// Print a message on its own line, then redraw the status line
    fn print_line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "\r{}", message)?;
        self.draw_status()
    }
}
