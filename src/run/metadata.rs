//! Run directory metadata: the component manifest, step log discovery and
//! the timestamp encoded in the directory name.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::run::types::{Components, MASTER_LOG, STEP_LOG_SUFFIX};

/// Manifest of component versions inside a run directory
pub const COMPONENTS_FILE: &str = "components.txt";

static RUN_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})_(\d{6})").expect("run timestamp pattern is valid"));

static REVISION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"revision=([^,\]]+)").expect("revision pattern is valid"));

/// Parse the `YYYYMMDD_HHMMSS` prefix of a run name
pub fn parse_run_timestamp(name: &str) -> Option<NaiveDateTime> {
    let caps = RUN_TIMESTAMP.captures(name)?;
    let stamp = format!("{}_{}", &caps[1], &caps[2]);
    match NaiveDateTime::parse_from_str(&stamp, "%Y%m%d_%H%M%S") {
        Ok(ts) => Some(ts),
        Err(e) => {
            log::warn!("Run {} has an invalid timestamp prefix: {}", name, e);
            None
        }
    }
}

/// Load component versions from `<run>/components.txt`.
///
/// A missing or unreadable manifest yields an empty mapping.
pub fn load_components(run_path: &Path) -> Components {
    let path = run_path.join(COMPONENTS_FILE);
    match fs::read(&path) {
        Ok(bytes) => parse_components(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            log::debug!("No components loaded from {}: {}", path.display(), e);
            Components::new()
        }
    }
}

/// Parse manifest text. Two line grammars are understood:
/// - `key=value`
/// - `name [type=src, remote=origin, revision=abc123, ...]`
///
/// A line whose `[` comes before its first `=` is a repo line and only
/// contributes when it carries a `revision=` attribute.
pub fn parse_components(text: &str) -> Components {
    let mut components = Components::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match (line.find('['), line.find('=')) {
            (Some(bracket), Some(eq)) if bracket < eq => {
                let (name, attrs) = line.split_at(bracket);
                let attrs = attrs[1..].trim_end_matches(']');
                if let Some(caps) = REVISION.captures(attrs) {
                    components.insert(name.trim(), caps[1].trim());
                }
            }
            (_, Some(eq)) => {
                components.insert(line[..eq].trim(), line[eq + 1..].trim());
            }
            _ => {}
        }
    }

    components
}

/// Discover the step logs of a run: every `<step>_log.txt` file except the
/// master log. Returned names are sorted and unique.
pub fn discover_step_logs(run_path: &Path) -> BTreeSet<String> {
    let mut steps = BTreeSet::new();

    let entries = match fs::read_dir(run_path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", run_path.display(), e);
            return steps;
        }
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name == MASTER_LOG || file_name.starts_with('.') {
            continue;
        }
        if !entry.path().is_file() {
            continue;
        }
        if let Some(step) = file_name.strip_suffix(STEP_LOG_SUFFIX) {
            if !step.is_empty() {
                steps.insert(step.to_string());
            }
        }
    }

    steps
}
