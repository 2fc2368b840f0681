//! Parsing of single log lines.
//!
//! Lines look like `194 \x1b[1;32mINFO\x1b[0m message`: a leading integer
//! timestamp, whitespace, then free-form content that may carry a colour
//! decorated severity word.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TIMESTAMPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\s+(.*)$").expect("line pattern is valid"));

static DECORATED_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[1;\d+m(\w+)\x1b\[0m").expect("level pattern is valid"));

/// Characters that disqualify a step header candidate
const HEADER_REJECT: &[char] = &['/', '\\', '[', ']'];

/// A parsed log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    /// Leading integer, when the line starts with digits and whitespace
    pub timestamp: Option<u128>,
    /// Rest of the line, decoration included
    pub content: String,
}

impl LogLine {
    /// Severity word embedded in the content, if any
    pub fn level(&self) -> Option<&str> {
        extract_level(&self.content)
    }

    /// Render as `<ts:>5> [<level:<5>] <content>`, `<ts:>5> <content>` or the
    /// bare content, depending on what was recognized.
    pub fn render(&self) -> String {
        match (self.timestamp, self.level()) {
            (Some(ts), Some(level)) => format!("{:>5} [{:<5}] {}", ts, level, self.content),
            (Some(ts), None) => format!("{:>5} {}", ts, self.content),
            (None, _) => self.content.clone(),
        }
    }
}

/// Split a raw line into timestamp and content.
///
/// Lines that do not start with digits followed by whitespace keep their
/// full text (trailing newline removed) as content. Timestamps too large for
/// `u128` saturate.
pub fn parse_line(raw: &str) -> LogLine {
    let line = raw.trim_end_matches('\n');

    if let Some(caps) = TIMESTAMPED.captures(line) {
        // only overflow can fail here; clamp instead of losing the split
        let timestamp = caps[1].parse::<u128>().unwrap_or(u128::MAX);
        return LogLine {
            timestamp: Some(timestamp),
            content: caps[2].to_string(),
        };
    }

    LogLine {
        timestamp: None,
        content: line.to_string(),
    }
}

/// First colour decorated word in `content` (`\x1b[1;Nm WORD \x1b[0m`)
pub fn extract_level(content: &str) -> Option<&str> {
    DECORATED_LEVEL
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Best-effort step header detection: the text before the first colon of
/// an unindented line, unless it looks like a path or a bracketed tag.
pub fn extract_step_header(content: &str) -> Option<&str> {
    if content.starts_with(' ') {
        return None;
    }
    let (head, _) = content.split_once(':')?;
    let head = head.trim();
    if head.is_empty() || head.contains(HEADER_REJECT) {
        return None;
    }
    Some(head)
}
