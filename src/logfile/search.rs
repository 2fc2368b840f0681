//! Regex search over one or all logs of a run.

use regex::{Captures, Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crate::error::ViewerResult;
use crate::logfile::line::parse_line;
use crate::logfile::open_lines;
use crate::run::SanityRun;

/// Marker wrapped around every match in highlighted output
pub const HIGHLIGHT_MARKER: &str = "**";

/// Which logs of a run to search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope<'a> {
    /// A single step log
    Step(&'a str),
    /// Every step log, then the master log
    All,
}

/// A matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// 1-based line number in the log
    pub line: usize,
    pub timestamp: Option<u128>,
    /// Searchable content, untouched
    pub content: String,
    /// Content with every match wrapped in [`HIGHLIGHT_MARKER`]
    pub highlighted: String,
}

/// Matches found in one log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchGroup {
    pub log: String,
    pub hits: Vec<SearchHit>,
}

/// A log that could not be read during a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLog {
    pub log: String,
    pub reason: String,
}

/// Result of a search across logs, grouped in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub pattern: String,
    /// Only logs with at least one match
    pub groups: Vec<SearchGroup>,
    pub total: usize,
    pub skipped: Vec<SkippedLog>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f)?;
            writeln!(f, "=== {} log ({} matches) ===", group.log, group.hits.len())?;
            for hit in &group.hits {
                writeln!(f, "{:>5}: {}", hit.timestamp.unwrap_or(0), hit.highlighted)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Total matches: {}", self.total)
    }
}

/// Compile a search pattern; case-insensitive unless `case_sensitive`
pub fn compile_pattern(pattern: &str, case_sensitive: bool) -> ViewerResult<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()?)
}

/// Wrap every match of `regex` in `content` with the highlight marker
pub fn highlight(regex: &Regex, content: &str) -> String {
    regex
        .replace_all(content, |caps: &Captures| {
            format!("{}{}{}", HIGHLIGHT_MARKER, &caps[0], HIGHLIGHT_MARKER)
        })
        .into_owned()
}

/// Scan one log file for lines whose content matches
pub fn search_file(path: &Path, regex: &Regex) -> io::Result<Vec<SearchHit>> {
    let mut hits = Vec::new();
    for (index, raw) in open_lines(path)?.enumerate() {
        let parsed = parse_line(&raw?);
        if !parsed.content.is_empty() && regex.is_match(&parsed.content) {
            hits.push(SearchHit {
                line: index + 1,
                timestamp: parsed.timestamp,
                highlighted: highlight(regex, &parsed.content),
                content: parsed.content,
            });
        }
    }
    Ok(hits)
}

/// Logs scanned concurrently; larger sets are searched in batches
pub const MAX_SEARCH_WORKERS: usize = 16;

/// Search labelled logs. Logs that do not exist are skipped silently; any
/// other read failure skips the log with a warning and a [`SkippedLog`]
/// entry. Neither stops the remaining logs.
///
/// Up to [`MAX_SEARCH_WORKERS`] logs are scanned at once, each on its own
/// scoped thread; groups come back in the order of `logs`.
pub fn search_logs(
    logs: &[(String, PathBuf)],
    pattern: &str,
    case_sensitive: bool,
) -> ViewerResult<SearchReport> {
    let regex = compile_pattern(pattern, case_sensitive)?;

    let outcomes: Vec<Option<io::Result<Vec<SearchHit>>>> = logs
        .chunks(MAX_SEARCH_WORKERS)
        .flat_map(|batch| search_batch(batch, &regex))
        .collect();

    let mut report = SearchReport {
        pattern: pattern.to_string(),
        groups: Vec::new(),
        total: 0,
        skipped: Vec::new(),
    };

    for ((label, path), outcome) in logs.iter().zip(outcomes) {
        match outcome {
            None => log::debug!("Skipping missing log {}", path.display()),
            Some(Ok(hits)) if hits.is_empty() => {}
            Some(Ok(hits)) => {
                report.total += hits.len();
                report.groups.push(SearchGroup {
                    log: label.clone(),
                    hits,
                });
            }
            Some(Err(e)) => {
                log::warn!("Error searching {}: {}", path.display(), e);
                report.skipped.push(SkippedLog {
                    log: label.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Scan one batch of logs concurrently. `None` marks a log that does not exist.
fn search_batch(
    batch: &[(String, PathBuf)],
    regex: &Regex,
) -> Vec<Option<io::Result<Vec<SearchHit>>>> {
    thread::scope(|scope| {
        let workers: Vec<_> = batch
            .iter()
            .map(|(label, path)| {
                thread::Builder::new()
                    .name(format!("search-{}", label))
                    .spawn_scoped(scope, move || match search_file(path, regex) {
                        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                        outcome => Some(outcome),
                    })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| match worker {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Some(Err(io::Error::other("search worker panicked")))),
                Err(e) => Some(Err(e)),
            })
            .collect()
    })
}

/// Search a run's logs within `scope`
pub fn search_run(
    run: &SanityRun,
    scope: SearchScope<'_>,
    pattern: &str,
    case_sensitive: bool,
) -> ViewerResult<SearchReport> {
    let logs = match scope {
        SearchScope::Step(step) => vec![(step.to_string(), run.require_step(step)?)],
        SearchScope::All => run.all_logs(),
    };
    search_logs(&logs, pattern, case_sensitive)
}
