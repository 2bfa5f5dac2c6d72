use crate::{
    report::Report,
    section::{Section, is_reserved_key},
};
use tracing::{debug, warn};

impl Report {
    /// Records an error of class `error_type` on the active step.
    ///
    /// The step status is set to `exit_code` on every call, so it reflects the
    /// most recently added error rather than the most severe one. A reserved
    /// `error_type` is refused and leaves the status alone.
    pub fn add_error(&mut self, exit_code: i64, error_type: &str, details: &str) -> Option<&mut Section> {
        if is_reserved_key(error_type) {
            warn!("cannot record error of type {error_type}: name is reserved");
            return None;
        }
        let step = self.active_step_mut()?;
        step.set("status", exit_code);

        let group = step.ensure_section("errors").ensure_section(error_type);
        let count = group.bump("errorCount");
        debug!("error {error_type}#{count} exit={exit_code}");

        let entry = group.create_section(&format!("error{count}"));
        entry.set("exitStatus", exit_code);
        entry.set("description", details);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_numbered_per_group() {
        let mut report = Report::with_step("cmsRun1");
        report.add_error(8001, "CMSException", "first");
        report.add_error(8001, "CMSException", "second");

        let step = report.retrieve_step("cmsRun1").unwrap();
        let group = step.section("errors").unwrap().section("CMSException").unwrap();
        assert_eq!(group.int("errorCount"), Some(2));
        assert_eq!(group.section("error1").unwrap().string("description"), Some("second"));
    }
}
