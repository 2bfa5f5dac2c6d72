//! Output modules of a step and the files they produced.
//!
//! Each module holds a `files` section (`fileCount` plus `file<N>` records)
//! and a single `dataset` descriptor taken from the first file accepted.

use crate::{
    file::FileRecord,
    report::Report,
    section::{
        MAX_STORED_U64, Node, SECTION_NAME_KEY, SECTIONS_KEY, Scalar, Section, is_reserved_key,
    },
};
use tracing::{debug, warn};

/// Attributes of a stored output file that are managed by the catalog rather
/// than copied from the caller's record.
/// Also covers the names of the record's own fields and the document
/// bookkeeping keys, so an extra can never shadow either.
pub(crate) const STRUCTURAL_KEYS: &[&str] = &[
    "inputs",
    "branches",
    "runs",
    "parents",
    "locations",
    "lfn",
    "size",
    "events",
    "newlocations",
    "new_locations",
    "dataset",
    "ModuleLabel",
    "module_label",
    SECTION_NAME_KEY,
    SECTIONS_KEY,
];

impl Report {
    /// Adds (or resets) output module `name` on the active step.
    pub fn add_output_module(&mut self, name: &str) -> Option<&mut Section> {
        if is_reserved_key(name) {
            warn!("cannot add output module {name}: name is reserved");
            return None;
        }
        let step = self.active_step_mut()?;
        Some(add_output_module_to(step, name))
    }

    /// Catalogs `file` under output module `module` of the active step.
    ///
    /// Incomplete files are dropped without creating anything, not even the
    /// module. So are files whose size, event count or lumi numbers do not fit
    /// the stored integer range. Returns the stored record on success.
    pub fn add_output_file(&mut self, module: &str, file: &FileRecord) -> Option<&mut Section> {
        if !file.is_complete() {
            debug!(
                "dropping incomplete output file lfn={:?} size={} events={}",
                file.lfn, file.size, file.events
            );
            return None;
        }
        if is_reserved_key(module) {
            warn!("cannot add output file {} to module {module}: name is reserved", file.lfn);
            return None;
        }
        if !fits_stored_range(file) {
            warn!("dropping output file {}: value exceeds {MAX_STORED_U64}", file.lfn);
            return None;
        }

        let step = self.active_step_mut()?;
        let has_module = step
            .section("output")
            .is_some_and(|output| output.section(module).is_some());
        if !has_module {
            add_output_module_to(step, module);
        }
        let out_mod = step.ensure_section("output").ensure_section(module);

        let dataset = out_mod.ensure_section("dataset");
        if dataset.is_empty() {
            for (k, v) in &file.dataset {
                if is_reserved_key(k) {
                    warn!("ignoring dataset field {k} on {}: name is reserved", file.lfn);
                    continue;
                }
                dataset.set(k.as_str(), v.clone());
            }
            dataset.set("OutputModuleName", module);
        }

        let files = out_mod.ensure_section("files");
        let count = files.bump("fileCount");
        let file_ref = files.create_section(&format!("file{count}"));
        fill_output_file(file_ref, file);
        Some(file_ref)
    }
}

pub(crate) fn add_output_module_to<'a>(step: &'a mut Section, name: &str) -> &'a mut Section {
    let listed = step
        .list("outputModules")
        .is_some_and(|mods| mods.iter().any(|m| m.as_str() == Some(name)));
    if listed {
        warn!("resetting existing output module {name}");
    } else {
        match step.list_mut("outputModules") {
            Some(mods) => mods.push(name.into()),
            None => step.set("outputModules", vec![Scalar::from(name)]),
        }
    }

    let out_mod = step.ensure_section("output").create_section(name);
    out_mod.create_section("files").set("fileCount", 0i64);
    out_mod.create_section("dataset");
    out_mod
}

fn fits_stored_range(file: &FileRecord) -> bool {
    let mut values = [file.size, file.events]
        .into_iter()
        .chain(file.runs.iter().flat_map(|r| r.lumis.iter().copied()));
    values.all(|v| v <= MAX_STORED_U64)
}

fn fill_output_file(file_ref: &mut Section, file: &FileRecord) {
    file_ref.create_section("inputs").set("fileCount", 0i64);
    file_ref.create_section("branches");

    let runs = file_ref.create_section("runs");
    for run in &file.runs {
        runs.set(run.run.to_string(), Node::list(run.lumis.iter().copied()));
    }

    file_ref.set("parents", Node::list(file.parents.iter().map(String::as_str)));

    // newlocations are appended as-is, duplicates included
    let locations = file
        .locations
        .iter()
        .chain(file.new_locations.iter().flatten())
        .map(String::as_str);
    file_ref.set("locations", Node::list(locations));

    file_ref.set("lfn", file.lfn.as_str());
    file_ref.set("size", file.size);
    file_ref.set("events", file.events);

    for (k, v) in &file.extra {
        if STRUCTURAL_KEYS.contains(&k.as_str()) {
            warn!("ignoring extra attribute {k} on {}: name is reserved", file.lfn);
            continue;
        }
        file_ref.set(k.as_str(), v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Run;

    #[test]
    fn stored_layout() {
        let mut report = Report::with_step("cmsRun1");
        let file = FileRecord::new("/store/a.root", 100, 10)
            .with_run(Run::new(1, [1, 2]))
            .with_location("siteA")
            .with_extra("guid", "abc");
        let stored = report.add_output_file("AODSIM", &file).unwrap();

        assert_eq!(stored.name(), "file0");
        assert_eq!(stored.section("inputs").unwrap().int("fileCount"), Some(0));
        assert!(stored.section("branches").unwrap().is_empty());
        assert_eq!(
            stored.section("runs").unwrap().list("1"),
            Some(&[Scalar::Int(1), Scalar::Int(2)][..])
        );
        assert_eq!(stored.string("guid"), Some("abc"));
        assert_eq!(stored.int("size"), Some(100));
    }

    #[test]
    fn record_field_names_are_not_extras() {
        let mut report = Report::with_step("cmsRun1");
        let file = FileRecord::new("/store/a.root", 100, 10)
            .with_extra("dataset", "shadow")
            .with_extra("ModuleLabel", "shadow")
            .with_extra("newlocations", "shadow")
            .with_extra(SECTION_NAME_KEY, "shadow")
            .with_extra("guid", "abc");
        let stored = report.add_output_file("AODSIM", &file).unwrap();

        for key in ["dataset", "ModuleLabel", "newlocations", SECTION_NAME_KEY] {
            assert!(!stored.contains(key), "{key} was stored");
        }
        assert_eq!(stored.string("guid"), Some("abc"));
    }
}
