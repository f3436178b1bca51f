/*!
 * Switchboard - company registry batch splitter
 *
 * Reads regional CSV extracts of the Brazilian company registry and, per
 * file:
 * - detects the delimiter from the header line
 * - keeps rows with a valid 14-digit CNPJ, first occurrence only
 * - normalizes the first phone number and classifies its carrier
 * - writes one `;`-delimited CSV per region and carrier bucket
 *
 * Files are processed concurrently on a fixed-size worker pool.
 */

pub mod cli_progress;
pub mod cli_style;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod stats;

// Re-export commonly used types
pub use config::{OutputNaming, SplitConfig};
pub use core::{discover_sources, run, CarrierClassifier, RunResult, SourceFile};
pub use error::{Result, SplitError};
pub use stats::{FileOutcome, RunReport, RunStatistics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
