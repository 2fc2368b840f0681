//! Rendering a log file, whole or by line range.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ViewerError, ViewerResult};
use crate::logfile::line::{extract_step_header, parse_line};
use crate::logfile::open_existing;

/// Which lines of a log to render.
///
/// Parsed from `--lines` values:
/// - `"50"`: the first 50 lines, with a truncation notice if more follow
/// - `"10:50"`: lines 10 to 50 inclusive (1-based)
/// - `"100:"`: line 100 to the end
/// - `":50"`: lines 1 to 50
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RangeSpec {
    #[default]
    All,
    Head(usize),
    Span {
        start: Option<usize>,
        end: Option<usize>,
    },
}

impl RangeSpec {
    /// Parse an optional line specification, falling back to the first
    /// `default_cap` lines (with a warning) when it is invalid.
    pub fn parse_or_cap(spec: Option<&str>, default_cap: usize) -> Self {
        match spec {
            None => RangeSpec::All,
            Some(spec) => spec.parse().unwrap_or_else(|e: ViewerError| {
                log::warn!("{}; showing the first {} lines", e, default_cap);
                RangeSpec::Head(default_cap)
            }),
        }
    }

    /// Whether an explicit selection was requested
    pub fn is_explicit(&self) -> bool {
        !matches!(self, RangeSpec::All)
    }
}

impl FromStr for RangeSpec {
    type Err = ViewerError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || ViewerError::InvalidRange(spec.to_string());
        let bound = |side: &str| -> Result<Option<usize>, ViewerError> {
            let side = side.trim();
            if side.is_empty() {
                Ok(None)
            } else {
                side.parse().map(Some).map_err(|_| invalid())
            }
        };

        match spec.split_once(':') {
            Some((start, end)) => Ok(RangeSpec::Span {
                start: bound(start)?,
                end: bound(end)?,
            }),
            None => spec.trim().parse().map(RangeSpec::Head).map_err(|_| invalid()),
        }
    }
}

/// Formatted lines of a log plus an optional trailing notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub lines: Vec<String>,
    /// Truncation notice or effective range summary
    pub footer: Option<String>,
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        if let Some(footer) = &self.footer {
            writeln!(f)?;
            writeln!(f, "{}", footer)?;
        }
        Ok(())
    }
}

/// Render a log file according to `range`.
///
/// A missing file is reported as [`ViewerError::LogNotFound`].
pub fn render(path: &Path, range: RangeSpec) -> ViewerResult<Rendered> {
    let mut lines = Vec::new();
    let mut footer = None;

    for (index, raw) in open_existing(path)?.enumerate() {
        let number = index + 1;
        let raw = raw.map_err(|e| ViewerError::io(path, e))?;

        match range {
            RangeSpec::All => {}
            RangeSpec::Head(max) => {
                if lines.len() >= max {
                    footer = Some(format!(
                        "... (showing first {} lines, use --lines to see more)",
                        max
                    ));
                    break;
                }
            }
            RangeSpec::Span { start, end } => {
                if start.is_some_and(|start| number < start) {
                    continue;
                }
                if end.is_some_and(|end| number > end) {
                    break;
                }
            }
        }

        lines.push(parse_line(&raw).render());
    }

    if let RangeSpec::Span { start, end } = range {
        let end = end.map(|e| e.to_string()).unwrap_or_else(|| "end".to_string());
        let start = start.filter(|s| *s > 0).unwrap_or(1);
        footer = Some(format!("... (showing lines {}:{})", start, end));
    }

    Ok(Rendered { lines, footer })
}

/// A step header candidate found in a log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepHeader {
    /// 1-based line number
    pub line: usize,
    pub timestamp: Option<u128>,
    pub name: String,
}

/// Collect the step header candidates of a log, in file order
pub fn outline(path: &Path) -> ViewerResult<Vec<StepHeader>> {
    let mut headers = Vec::new();
    for (index, raw) in open_existing(path)?.enumerate() {
        let raw = raw.map_err(|e| ViewerError::io(path, e))?;
        let parsed = parse_line(&raw);
        if let Some(name) = extract_step_header(&parsed.content) {
            headers.push(StepHeader {
                line: index + 1,
                timestamp: parsed.timestamp,
                name: name.to_string(),
            });
        }
    }
    Ok(headers)
}
