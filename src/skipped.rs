use crate::{
    report::Report,
    section::{MAX_STORED_U64, Scalar, Section},
};
use tracing::warn;

impl Report {
    /// Records an input file the active step could not open.
    pub fn add_skipped_file(&mut self, lfn: &str, pfn: &str) -> Option<&mut Section> {
        let files = self
            .active_step_mut()?
            .ensure_section("skipped")
            .ensure_section("files");
        let count = files.bump("fileCount");
        let entry = files.create_section(&format!("file{count}"));
        entry.set("PhysicalFileName", pfn);
        entry.set("LogicalFileName", lfn);
        Some(entry)
    }

    /// Records an event of `run` that the active step skipped. Event numbers
    /// above [`MAX_STORED_U64`] are refused.
    pub fn add_skipped_event(&mut self, run: u64, event: u64) -> Option<&mut Section> {
        if event > MAX_STORED_U64 {
            warn!("cannot record skipped event {event} of run {run}: out of range");
            return None;
        }
        let run_section = self
            .active_step_mut()?
            .ensure_section("skipped")
            .ensure_section("events")
            .ensure_section(&run.to_string());
        match run_section.list_mut("eventList") {
            Some(events) => events.push(event.into()),
            None => run_section.set("eventList", vec![Scalar::from(event)]),
        }
        Some(run_section)
    }
}
