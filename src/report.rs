use crate::section::{Node, Scalar, Section, is_reserved_key};
use tracing::{debug, warn};

/// Name of the root section of every report.
pub const REPORT_SECTION_NAME: &str = "FrameworkJobReport";

pub(crate) const STEPS_KEY: &str = "steps";

/// A job report: one section per execution step, in execution order.
///
/// Catalog, error and skip operations act on the *active* step, which is the
/// step most recently created (or the last step after a reload).
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    data: Section,
    active: Option<String>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    pub fn new() -> Self {
        let mut data = Section::new(REPORT_SECTION_NAME);
        data.set(STEPS_KEY, Vec::<Scalar>::new());
        Self { data, active: None }
    }

    pub fn with_step(name: &str) -> Self {
        let mut report = Self::new();
        report.create_section(name);
        report
    }

    /// Wraps an already-built report tree, e.g. one decoded from a document.
    pub fn from_data(data: Section) -> Self {
        let active = data
            .list(STEPS_KEY)
            .and_then(|steps| steps.last())
            .and_then(Scalar::as_str)
            .map(str::to_string);
        Self { data, active }
    }

    pub fn data(&self) -> &Section {
        &self.data
    }

    pub fn into_data(self) -> Section {
        self.data
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.data
            .list(STEPS_KEY)
            .map(|steps| steps.iter().filter_map(Scalar::as_str).collect())
            .unwrap_or_default()
    }

    pub fn active_step(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Makes an existing step the target of subsequent catalog operations.
    pub fn set_active_step(&mut self, name: &str) -> bool {
        if self.retrieve_step(name).is_none() {
            warn!("cannot activate unknown step {name}");
            return false;
        }
        self.active = Some(name.to_string());
        true
    }

    /// Creates the section for step `name` and makes it the active step.
    ///
    /// A name already present in the report, or a reserved document key, is
    /// logged and left untouched.
    pub fn create_section(&mut self, name: &str) {
        if is_reserved_key(name) {
            warn!("cannot create report section {name}: name is reserved");
            return;
        }
        if self.data.contains(name) {
            warn!("attempted to create pre-existing report section {name}");
            return;
        }

        match self.data.list_mut(STEPS_KEY) {
            Some(steps) => steps.push(name.into()),
            None => self.data.set(STEPS_KEY, vec![Scalar::from(name)]),
        }
        self.data.set(name, new_step_section(name));
        self.active = Some(name.to_string());
        debug!("created report section {name}");
    }

    pub fn retrieve_step(&self, step: &str) -> Option<&Section> {
        self.data.section(step)
    }

    pub fn retrieve_step_mut(&mut self, step: &str) -> Option<&mut Section> {
        self.data.section_mut(step)
    }

    pub fn step_status(&self, step: &str) -> Option<i64> {
        self.retrieve_step(step).and_then(|s| s.int("status"))
    }

    /// Records an analysis file produced by the active step.
    pub fn add_analysis_file<I, K, V>(&mut self, filename: &str, attrs: I) -> Option<&mut Section>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        let analysis = self.active_step_mut()?.ensure_section("analysis");
        let count = analysis.bump("fileCount");
        let entry = analysis.create_section(&format!("file{count}"));
        entry.set("fileName", filename);
        for (k, v) in attrs {
            let k: String = k.into();
            if is_reserved_key(&k) {
                warn!("ignoring analysis attribute {k} on {filename}: name is reserved");
                continue;
            }
            entry.set(k, v);
        }
        Some(entry)
    }

    pub(crate) fn active_step_mut(&mut self) -> Option<&mut Section> {
        match self.active.as_deref() {
            Some(name) => self.data.section_mut(name),
            None => {
                warn!("report has no active step");
                None
            }
        }
    }
}

fn new_step_section(name: &str) -> Section {
    let mut step = Section::new(name);
    step.set("id", Scalar::Null);
    step.set("task", Scalar::Null);
    step.set("workload", Scalar::Null);
    step.set("status", 0i64);
    step.set("outputModules", Vec::<Scalar>::new());

    for child in [
        "site",
        "output",
        "input",
        "performance",
        "analysis",
        "errors",
        "skipped",
        "parameters",
        "logs",
        "cleanup",
    ] {
        step.create_section(child);
    }

    let cleanup = step.ensure_section("cleanup");
    cleanup.create_section("removed");
    cleanup.create_section("unremoved");

    let skipped = step.ensure_section("skipped");
    skipped.create_section("events");
    skipped.create_section("files").set("fileCount", 0i64);

    step.ensure_section("analysis").set("fileCount", 0i64);
    step
}
