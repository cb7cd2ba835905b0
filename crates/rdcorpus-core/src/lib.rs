//! rdcorpus Core - Common infrastructure for corpus preprocessing pipelines
//!
//! This crate provides the pieces that do not depend on any particular
//! source format: logging, progress reporting and size-bounded batch
//! output with atomic file replacement.

pub mod batch;
pub mod logging;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use batch::{BatchBuffer, DEFAULT_MAX_BATCH_BYTES};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use sink::{BatchSink, cleanup_tmp_files, write_atomic, write_batch_file};
