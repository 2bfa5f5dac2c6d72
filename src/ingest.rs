use crate::{
    report::{Report, STEPS_KEY},
    section::is_reserved_key,
};
use anyhow::Result;
use std::path::Path;
use tracing::warn;

/// Exit code recorded when a step's raw report cannot be read.
pub const MISSING_REPORT_EXIT_CODE: i64 = 50115;
/// Error class recorded when a step's raw report cannot be read.
pub const MISSING_REPORT_ERROR_TYPE: &str = "MissingJobReport";
/// Step that receives the failure when the source path has no usable name.
pub const FALLBACK_STEP_NAME: &str = "ingest";

/// Populates a report from the raw output a step left behind.
pub trait Ingest {
    fn ingest(&self, report: &mut Report, source: &Path) -> Result<()>;
}

impl<F> Ingest for F
where
    F: Fn(&mut Report, &Path) -> Result<()>,
{
    fn ingest(&self, report: &mut Report, source: &Path) -> Result<()> {
        self(report, source)
    }
}

impl Report {
    /// Runs `ingestor` over `source`. A failure is not returned; it is
    /// recorded on the active step as a [`MISSING_REPORT_ERROR_TYPE`] error.
    ///
    /// Without an active step the failure goes to a step named after the
    /// file stem of `source`, created if needed.
    pub fn parse(&mut self, ingestor: &dyn Ingest, source: &Path) {
        if let Err(err) = ingestor.ingest(self, source) {
            warn!("ingesting {} failed: {err:#}", source.display());
            if self.active_step().is_none() {
                let name = failure_step_name(source);
                if self.retrieve_step(&name).is_some() {
                    self.set_active_step(&name);
                } else {
                    self.create_section(&name);
                }
            }
            let msg = format!(
                "Error reading job report file, possibly corrupt file:\nDetails: {err:#}"
            );
            self.add_error(MISSING_REPORT_EXIT_CODE, MISSING_REPORT_ERROR_TYPE, &msg);
        }
    }
}

fn failure_step_name(source: &Path) -> String {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != STEPS_KEY && !is_reserved_key(s))
        .unwrap_or(FALLBACK_STEP_NAME)
        .to_string()
}
