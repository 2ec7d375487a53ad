//! Read-merge-write JSON persistence of measurement series.
//!
//! One JSON document exists per benchmark family, at `<family>_runs.json`. The
//! document is loaded lazily on the first save for a family, accumulated in
//! memory across all saves within one process run, and rewritten in full after
//! every save call, so partial runs still persist everything saved so far.
//! Repeated runs append rather than overwrite: a modeling tool consumes growing
//! series across invocations, and the explicit [`ResultStore::remove`]
//! operation exists for when a clean document is wanted instead.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::fs;

use serde::{Deserialize, Serialize};

use crate::Trial;

/// Metric name for reference measurements.
pub const METRIC_REFERENCE_TIME: &str = "Reference time in us";

/// Metric name for test measurements.
pub const METRIC_TEST_TIME: &str = "Test time in us";

/// Metric name for derived overhead.
pub const METRIC_OVERHEAD: &str = "Overhead time in us";

/// One measured point of a series: the axis-value tuple and the full
/// repetition-ordered sample sequence observed there.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[allow(
    clippy::exhaustive_structs,
    reason = "mirrors the on-disk schema, which is fixed"
)]
pub struct SeriesEntry {
    /// Axis values in the order named by the document's `parameters` list.
    pub point: Vec<u64>,

    /// All samples collected at this point, in repetition order.
    pub values: Vec<f64>,
}

/// The on-disk document for one benchmark family: test name, then metric name,
/// then the ordered series entries, plus the axis names in point order.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResultDocument {
    #[serde(default)]
    measurements: BTreeMap<String, BTreeMap<String, Vec<SeriesEntry>>>,

    #[serde(default)]
    parameters: Vec<String>,
}

impl ResultDocument {
    /// Loads the document at `path`.
    ///
    /// A missing or unparseable file is prior-data-free, not an error; there is
    /// deliberately no distinction between "file absent" and "file unreadable".
    #[must_use]
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    /// Appends `entries` to the series under `test_name` / `metric`, after any
    /// entries already recorded there.
    ///
    /// This is the single place implementing the accumulation policy; every
    /// series grows monotonically within a document, including the deliberately
    /// duplicated reference entries the sweep engine produces.
    pub fn merge_series(&mut self, test_name: &str, metric: &str, entries: Vec<SeriesEntry>) {
        self.measurements
            .entry(test_name.to_owned())
            .or_default()
            .entry(metric.to_owned())
            .or_default()
            .extend(entries);
    }

    /// Records the axis names matching the point order of every entry.
    pub fn set_parameters(&mut self, names: &[&str]) {
        self.parameters = names.iter().map(|&name| name.to_owned()).collect();
    }

    /// The series recorded under `test_name` / `metric`, if any.
    #[must_use]
    pub fn series(&self, test_name: &str, metric: &str) -> Option<&[SeriesEntry]> {
        self.measurements
            .get(test_name)
            .and_then(|metrics| metrics.get(metric))
            .map(Vec::as_slice)
    }

    /// The recorded axis names.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Rewrites the whole document to `path`.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .expect("document of maps, strings and numbers always serializes");

        fs::write(path, contents)
    }
}

/// The per-family point tuple and axis naming.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_enums,
    reason = "the three benchmark families are the complete set"
)]
pub enum PointLayout {
    /// Threads, workload, iterations.
    Worksharing,
    /// Array size, iterations, workload.
    Offload,
    /// Branching factor, workload, total task count.
    TaskTree,
}

impl PointLayout {
    /// Axis names in point order.
    #[must_use]
    pub fn parameters(self) -> [&'static str; 3] {
        match self {
            Self::Worksharing => ["Threads", "Workload", "Iterations"],
            Self::Offload => ["Arraysize", "Iterations", "Workload"],
            Self::TaskTree => ["Branches", "Workload", "Number of Tasks"],
        }
    }

    /// Extracts the axis-value tuple from a trial, in the same order as
    /// [`PointLayout::parameters`].
    #[must_use]
    pub fn point(self, trial: &Trial) -> Vec<u64> {
        match self {
            Self::Worksharing => vec![
                u64::from(trial.threads),
                trial.workload,
                trial.iterations,
            ],
            Self::Offload => vec![trial.array_size, trial.iterations, trial.workload],
            Self::TaskTree => vec![u64::from(trial.child_nodes), trial.workload, trial.tasks],
        }
    }
}

/// Persists measurement series, caching one [`ResultDocument`] per family for
/// the lifetime of the process.
#[derive(Debug, Default)]
pub struct ResultStore {
    directory: PathBuf,
    documents: HashMap<PathBuf, ResultDocument>,
}

impl ResultStore {
    /// Creates a store writing into the current working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store writing into `directory`.
    #[must_use]
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            documents: HashMap::new(),
        }
    }

    /// The file path holding the given family's document.
    #[must_use]
    pub fn file_path(&self, family: &str) -> PathBuf {
        self.directory.join(format!("{family}_runs.json"))
    }

    /// Merges `records` into the family's document under `test_name` /
    /// `metric` and rewrites the document on disk.
    ///
    /// The document is loaded from disk the first time a family is saved;
    /// afterwards the in-memory copy accumulates across saves.
    pub fn save(
        &mut self,
        family: &str,
        test_name: &str,
        records: &[Trial],
        metric: &str,
        layout: PointLayout,
    ) -> io::Result<()> {
        let path = self.file_path(family);

        let document = self
            .documents
            .entry(path.clone())
            .or_insert_with(|| ResultDocument::load(&path));

        let entries = records
            .iter()
            .map(|record| SeriesEntry {
                point: layout.point(record),
                values: record.samples.clone(),
            })
            .collect();

        document.merge_series(test_name, metric, entries);
        document.set_parameters(&layout.parameters());
        document.save(&path)
    }

    /// Deletes the family's document, on disk and in memory, so the next sweep
    /// starts from a clean state instead of accumulating onto prior runs.
    pub fn remove(&mut self, family: &str) -> io::Result<()> {
        let path = self.file_path(family);
        self.documents.remove(&path);

        match fs::remove_file(&path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
            _ => Ok(()),
        }
    }
}
