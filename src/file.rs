use crate::section::{Node, Scalar};
use serde::Serialize;
use std::collections::BTreeMap;

/// A run number and the lumi sections of that run a file covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub run: u64,
    pub lumis: Vec<u64>,
}

impl Run {
    pub fn new(run: u64, lumis: impl IntoIterator<Item = u64>) -> Self {
        Self {
            run,
            lumis: lumis.into_iter().collect(),
        }
    }
}

/// Flat description of a data file, as handed to the output catalog and as
/// rebuilt from a stored report.
///
/// `size`, `events` and lumi numbers are stored as signed 64-bit integers;
/// the catalog refuses a file with any of them above `i64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileRecord {
    pub lfn: String,
    pub size: u64,
    pub events: u64,
    pub runs: Vec<Run>,
    pub parents: Vec<String>,
    pub locations: Vec<String>,
    /// Locations gained during the step; merged into `locations` on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_locations: Option<Vec<String>>,
    pub dataset: BTreeMap<String, Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_label: Option<String>,
    /// Any further attributes, copied verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Node>,
}

impl FileRecord {
    pub fn new(lfn: impl Into<String>, size: u64, events: u64) -> Self {
        Self {
            lfn: lfn.into(),
            size,
            events,
            ..Default::default()
        }
    }

    /// A file is only catalogued once it has a name, a size and events.
    pub fn is_complete(&self) -> bool {
        !(self.lfn.is_empty() || self.size == 0 || self.events == 0)
    }

    pub fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn with_parent(mut self, lfn: impl Into<String>) -> Self {
        self.parents.push(lfn.into());
        self
    }

    pub fn with_dataset_field(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.dataset.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
