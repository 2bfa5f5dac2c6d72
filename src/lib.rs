//! Job execution reports.
//!
//! A [`Report`] keeps one section per execution step recording the inputs a
//! step read, the output files it produced, the errors it hit and what it
//! skipped. Reports convert to and from a generic JSON document, persist to
//! disk, and rebuild flat [`FileRecord`]s for downstream consumers.

pub mod cli;
pub mod config;
pub mod document;
pub mod error_log;
pub mod file;
pub mod ingest;
pub mod input;
pub mod output;
pub mod query;
pub mod report;
pub mod section;
pub mod skipped;
pub mod util;

pub use file::{FileRecord, Run};
pub use ingest::Ingest;
pub use report::Report;
pub use section::{Node, Scalar, Section};
