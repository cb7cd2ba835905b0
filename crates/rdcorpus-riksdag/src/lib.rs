//! rdcorpus Riksdag - preprocessing of Riksdagens öppna data
//!
//! Turns zipped document records into corpus source files: embedded HTML
//! is scrubbed and reduced to `page` / `p` / text, record metadata is
//! attached as attributes, and documents are batched into size-bounded
//! XML files. A JSON ledger makes re-runs skip finished entries.
//!
//! # Example
//!
//! ```ignore
//! use rdcorpus_core::ProgressContext;
//! use rdcorpus_riksdag::{Config, run};
//!
//! let config = Config {
//!     corpora: vec!["rd-prot".into()],
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &ProgressContext::new())?;
//! println!("Wrote {} documents", summary.entries_written);
//! ```

pub mod clean;
pub mod config;
pub mod corpus;
pub mod document;
pub mod dom;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod record;
pub mod runner;
pub mod sanitize;
pub mod sparv;
pub mod worker;

// Re-exports
pub use config::Config;
pub use corpus::{CorpusInfo, CorpusTable};
pub use error::{ExtractError, UnknownCorpus};
pub use extract::{ExtractOptions, Extraction, extract};
pub use ledger::{ArchiveLedger, Ledger};
pub use runner::{Summary, run};
pub use sanitize::{SanitizeReport, Sanitized, sanitize};
