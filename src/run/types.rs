use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::error::{ViewerError, ViewerResult};
use crate::run::metadata::{discover_step_logs, load_components, parse_run_timestamp};

/// File name of the run-wide log
pub const MASTER_LOG: &str = "master_log.txt";

/// Suffix shared by every step log file
pub const STEP_LOG_SUFFIX: &str = "_log.txt";

/// Label used for the master log in multi-log results
pub const MASTER_LABEL: &str = "master";

/// Display format for run timestamps
pub const TIMESTAMP_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// Component name to version mapping, kept in file order.
///
/// Lookups are by key; a repeated key keeps its first position and takes
/// the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Components(Vec<(String, String)>);

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        let name = name.into();
        let version = version.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = version,
            None => self.0.push((name, version)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, version)| version.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, version)| (name.as_str(), version.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Components {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut components = Components::new();
        for (name, version) in iter {
            components.insert(name, version);
        }
        components
    }
}

/// One discovered sanity test execution.
///
/// Built once per discovery pass and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SanityRun {
    /// Directory basename, the natural sort and lookup key
    pub name: String,

    /// Location of the run directory
    pub path: PathBuf,

    /// Parsed from a `YYYYMMDD_HHMMSS` name prefix
    pub timestamp: Option<NaiveDateTime>,

    /// Component versions from `components.txt`
    pub components: Components,

    /// Step names, sorted and unique
    pub step_logs: BTreeSet<String>,

    /// `<run>/master_log.txt`, which may not exist
    pub master_log: PathBuf,
}

impl SanityRun {
    /// Load a run from its directory
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            timestamp: parse_run_timestamp(&name),
            components: load_components(&path),
            step_logs: discover_step_logs(&path),
            master_log: path.join(MASTER_LOG),
            name,
            path,
        }
    }

    /// Path of a step log, whether or not the step exists
    pub fn step_log_path(&self, step: &str) -> PathBuf {
        self.path.join(format!("{}{}", step, STEP_LOG_SUFFIX))
    }

    pub fn has_step(&self, step: &str) -> bool {
        self.step_logs.contains(step)
    }

    /// Path of a known step's log, or an error listing the available steps
    pub fn require_step(&self, step: &str) -> ViewerResult<PathBuf> {
        if self.has_step(step) {
            Ok(self.step_log_path(step))
        } else {
            Err(ViewerError::StepNotFound {
                step: step.to_string(),
                run: self.name.clone(),
                available: self.step_logs.iter().cloned().collect(),
            })
        }
    }

    /// Every step log followed by the master log
    pub fn all_logs(&self) -> Vec<(String, PathBuf)> {
        self.step_logs
            .iter()
            .map(|step| (step.clone(), self.step_log_path(step)))
            .chain(std::iter::once((MASTER_LABEL.to_string(), self.master_log.clone())))
            .collect()
    }

    /// Timestamp formatted for display, or `Unknown`
    pub fn timestamp_display(&self) -> String {
        self.timestamp
            .map(|ts| ts.format(TIMESTAMP_DISPLAY).to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

impl fmt::Display for SanityRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {} steps",
            self.name,
            self.timestamp_display(),
            self.step_logs.len()
        )
    }
}
