/*!
 * Core partitioning pipeline
 *
 * Leaves first: delimiter detection, record validation, phone
 * normalization and carrier classification feed the per-file pipeline;
 * the coordinator runs one pipeline per source file on a worker pool.
 */

pub mod carrier;
pub mod coordinator;
pub mod delimiter;
pub mod discovery;
pub mod export;
pub mod latin1;
pub mod numbering;
pub mod phone;
pub mod pipeline;
pub mod progress;
pub mod record;

pub use carrier::{CarrierClassifier, CarrierLabel, NumberingPlan};
pub use coordinator::{build_classifier, run, RunResult};
pub use delimiter::{detect_delimiter, Delimiter, DelimiterChoice};
pub use discovery::{discover_sources, SourceFile};
pub use export::{export_buckets, Buckets, OperatorBucket};
pub use numbering::{BrazilNumberingPlan, CarrierTable};
pub use phone::{normalize_first_phone, NormalizedPhone};
pub use pipeline::{process_file, PipelineContext, PipelineStage};
pub use record::{Record, RecordValidator, RowVerdict};
