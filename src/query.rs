//! Rebuilds flat [`FileRecord`]s from the output sections of a stored report.
//!
//! Aggregating queries are all-or-nothing: if any expected module, file or
//! step cannot be rebuilt the whole query returns `None`.

use crate::{
    file::{FileRecord, Run},
    report::Report,
    section::{Node, Scalar, Section},
};
use tracing::{debug, error};

impl Report {
    pub fn get_output_module(&self, step: &str, module: &str) -> Option<&Section> {
        self.retrieve_step(step)?.section("output")?.section(module)
    }

    /// Rebuilds output file `file_key` (e.g. `file0`) of `module` in `step`.
    pub fn get_output_file(&self, file_key: &str, module: &str, step: &str) -> Option<FileRecord> {
        let out_mod = self.get_output_module(step, module)?;
        let Some(file_ref) = out_mod.section("files").and_then(|f| f.section(file_key)) else {
            debug!("no {file_key} in output module {module} of step {step}");
            return None;
        };

        let mut file = FileRecord::default();
        for (key, node) in file_ref.entries() {
            match key {
                "locations" => file.locations = strings(node),
                "parents" => file.parents = strings(node),
                "runs" => file.runs = runs(node, file_key)?,
                "lfn" => file.lfn = node.as_scalar().and_then(Scalar::as_str).unwrap_or_default().into(),
                "size" => file.size = node.as_scalar().and_then(Scalar::as_u64).unwrap_or(0),
                "events" => file.events = node.as_scalar().and_then(Scalar::as_u64).unwrap_or(0),
                "inputs" | "branches" => {}
                other => {
                    file.extra.insert(other.to_string(), node.clone());
                }
            }
        }

        if let Some(dataset) = out_mod.section("dataset") {
            for (key, node) in dataset.entries() {
                if let Node::Scalar(value) = node {
                    file.dataset.insert(key.to_string(), value.clone());
                }
            }
        }
        file.module_label = Some(module.to_string());
        Some(file)
    }

    /// All files of one output module, in catalog order.
    pub fn get_files_from_output_module(&self, step: &str, module: &str) -> Option<Vec<FileRecord>> {
        let out_mod = self.get_output_module(step, module)?;
        let count = out_mod
            .section("files")
            .and_then(|f| f.int("fileCount"))
            .unwrap_or(0);

        let mut files = Vec::new();
        for n in 0..count {
            match self.get_output_file(&format!("file{n}"), module, step) {
                Some(file) => files.push(file),
                None => {
                    error!("could not find file{n} in module {module} of step {step}");
                    return None;
                }
            }
        }
        Some(files)
    }

    /// All output files of one step, module by module.
    pub fn get_all_files_from_step(&self, step: &str) -> Option<Vec<FileRecord>> {
        let step_report = self.retrieve_step(step)?;
        let modules = step_report.list("outputModules").unwrap_or_default();
        if modules.is_empty() {
            debug!("step {step} has no output modules");
            return None;
        }

        let mut files = Vec::new();
        for module in modules.iter().filter_map(Scalar::as_str) {
            match self.get_files_from_output_module(step, module) {
                Some(found) if !found.is_empty() => files.extend(found),
                _ => {
                    error!("no files recovered from module {module} of step {step}");
                    return None;
                }
            }
        }
        Some(files)
    }

    /// All output files of every step, in step order.
    pub fn get_all_files(&self) -> Option<Vec<FileRecord>> {
        let mut files = Vec::new();
        for step in self.step_names() {
            match self.get_all_files_from_step(step) {
                Some(found) if !found.is_empty() => files.extend(found),
                _ => {
                    error!("no files recovered from step {step}");
                    return None;
                }
            }
        }
        Some(files)
    }
}

fn strings(node: &Node) -> Vec<String> {
    node.as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(Scalar::as_str)
        .map(str::to_string)
        .collect()
}

fn runs(node: &Node, file_key: &str) -> Option<Vec<Run>> {
    let Some(runs) = node.as_section() else {
        error!("runs of {file_key} is not a section");
        return None;
    };
    let mut out = Vec::new();
    for (run, lumis) in runs.entries() {
        let Ok(number) = run.parse::<u64>() else {
            error!("run key {run:?} of {file_key} is not a run number");
            return None;
        };
        let lumis = lumis
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Scalar::as_u64)
            .collect::<Vec<_>>();
        out.push(Run::new(number, lumis));
    }
    Some(out)
}
