//! Filtering a log by severity level.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::{ViewerError, ViewerResult};
use crate::logfile::line::parse_line;
use crate::logfile::open_existing;

const RULE_WIDTH: usize = 80;

/// Lines of one log carrying a given severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    /// Requested level, as typed
    pub level: String,
    /// Step name or `master`
    pub log: String,
    pub lines: Vec<String>,
    pub count: usize,
}

impl fmt::Display for LevelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filtering {} log for {} messages", self.log, self.level)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)?;
        writeln!(f, "Found {} {} messages.", self.count, self.level)
    }
}

/// Keep the lines of `path` whose decorated level equals `level`,
/// ignoring case. Lines without a recognizable level never match.
pub fn filter_by_level(path: &Path, log: &str, level: &str) -> ViewerResult<LevelReport> {
    let mut lines = Vec::new();

    for raw in open_existing(path)? {
        let raw = raw.map_err(|e| ViewerError::io(path, e))?;
        let parsed = parse_line(&raw);
        if parsed
            .level()
            .is_some_and(|found| found.eq_ignore_ascii_case(level))
        {
            lines.push(parsed.render());
        }
    }

    Ok(LevelReport {
        level: level.to_string(),
        log: log.to_string(),
        count: lines.len(),
        lines,
    })
}
