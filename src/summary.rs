//! Per-step status and timing for a run.
//!
//! A step's outcome comes from, in order of preference:
//! 1. an `Overall result: ...` line anywhere in its log,
//! 2. the completion marker near the end of the log,
//! 3. generic success/failure phrases near the end of the log.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::config::StatusHeuristics;
use crate::logfile::{read_text, strip_decorations};
use crate::run::SanityRun;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Total duration:\s*([0-9]+\.?[0-9]*s)").expect("duration pattern is valid")
});

static OVERALL_RESULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Overall result:\s*(\w+)\s+total=(\d+)\s+failures=(\d+)\s+errors=(\d+)\s+skipped=(\d+),?\s*not_applicable=(\d+),?\s*soundCardFailures=(\d+)",
    )
    .expect("overall result pattern is valid")
});

const DURATION_PREFIX: &str = "Total duration:";
const RULE_WIDTH: usize = 80;

/// Outcome of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Passed,
    Failed,
    Completed,
    Unknown,
    /// The log exists but could not be read
    Error,
    /// The log disappeared after discovery
    Missing,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Passed => "PASSED",
            StepStatus::Failed => "FAILED",
            StepStatus::Completed => "COMPLETED",
            StepStatus::Unknown => "UNKNOWN",
            StepStatus::Error => "ERROR",
            StepStatus::Missing => "MISSING",
        };
        f.write_str(s)
    }
}

/// Counts from an `Overall result:` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// Status word as written by the test runner
    pub status: String,
    pub total: u64,
    pub failures: u64,
    pub errors: u64,
    pub skipped: u64,
    pub not_applicable: u64,
    pub soundcard_failures: u64,
}

impl StepResult {
    pub fn has_failures(&self) -> bool {
        self.failures > 0 || self.errors > 0
    }
}

/// One row of a run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub step: String,
    pub status: StepStatus,
    /// Duration token such as `364.01s`
    pub duration: Option<String>,
    pub result: Option<StepResult>,
}

impl StepSummary {
    /// Duration in seconds, when the token parses as a number
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration
            .as_deref()
            .and_then(|d| d.trim_end_matches('s').parse().ok())
    }
}

impl fmt::Display for StepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == StepStatus::Missing {
            return write!(f, "{:<30} - Log file missing", self.step);
        }

        write!(f, "{:<30} - {} ", self.step, self.status)?;
        if let Some(duration) = &self.duration {
            write!(f, "({})", duration)?;
        }
        match &self.result {
            Some(result) if result.has_failures() => write!(
                f,
                " - {} Failures, {} Errors, {} Tests",
                result.failures, result.errors, result.total
            ),
            Some(result) => write!(f, " - {} Tests PASSED", result.total),
            None => Ok(()),
        }
    }
}

/// Sum of the step durations that could be parsed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalDuration {
    pub seconds: f64,
    /// Steps whose duration went into `seconds`
    pub contributing: usize,
    /// All steps of the run
    pub steps: usize,
}

impl fmt::Display for TotalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contributing == 0 {
            return write!(f, "Total Duration: No timing information available");
        }

        let minutes = (self.seconds / 60.0).floor();
        if minutes > 0.0 {
            writeln!(
                f,
                "Total Duration: {}m {:.2}s ({:.2}s total)",
                minutes as u64,
                self.seconds % 60.0,
                self.seconds
            )?;
        } else {
            writeln!(f, "Total Duration: {:.2}s", self.seconds)?;
        }
        write!(f, "Steps with timing: {}/{}", self.contributing, self.steps)
    }
}

/// Status and timing of every step of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run: String,
    pub steps: Vec<StepSummary>,
    pub total: TotalDuration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "Step Summary for {}", self.run)?;
        writeln!(f, "{}", rule)?;
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", self.total)
    }
}

// ============================================================================
// Text scans
// ============================================================================

/// Last `Total duration:` token in `text`
pub fn duration_in(text: &str) -> Option<String> {
    text.lines()
        .rev()
        .filter(|line| line.trim().starts_with(DURATION_PREFIX))
        .find_map(|line| DURATION.captures(line).map(|caps| caps[1].to_string()))
}

/// First `Overall result:` line in `text`, decorations ignored
pub fn test_result_in(text: &str) -> Option<StepResult> {
    let plain = strip_decorations(text);
    let caps = OVERALL_RESULT.captures(&plain)?;
    let count = |i: usize| caps[i].parse::<u64>().ok();

    Some(StepResult {
        status: caps[1].to_string(),
        total: count(2)?,
        failures: count(3)?,
        errors: count(4)?,
        skipped: count(5)?,
        not_applicable: count(6)?,
        soundcard_failures: count(7)?,
    })
}

/// Keyword fallback over the last lines of `text`
pub fn status_from_tail(text: &str, heuristics: &StatusHeuristics) -> StepStatus {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(heuristics.tail_lines);
    let tail = lines[start..].join("\n").to_lowercase();

    let any = |phrases: &[String]| phrases.iter().any(|p| tail.contains(p.as_str()));

    if tail.contains(heuristics.completion_marker.as_str()) {
        if any(&heuristics.failure_phrases) {
            StepStatus::Failed
        } else {
            StepStatus::Completed
        }
    } else if any(&heuristics.success_phrases) {
        StepStatus::Completed
    } else if any(&heuristics.failure_phrases) {
        StepStatus::Failed
    } else {
        StepStatus::Unknown
    }
}

fn status_of(result: Option<&StepResult>, text: &str, heuristics: &StatusHeuristics) -> StepStatus {
    match result {
        Some(result) if result.has_failures() => StepStatus::Failed,
        Some(_) => StepStatus::Passed,
        None => status_from_tail(text, heuristics),
    }
}

// ============================================================================
// File operations
// ============================================================================

/// Duration reported at the end of a step log; the last occurrence wins
pub fn extract_duration(path: &Path) -> Option<String> {
    read_text(path).ok().and_then(|text| duration_in(&text))
}

/// Test counts from a step log
pub fn extract_test_result(path: &Path) -> Option<StepResult> {
    read_text(path).ok().and_then(|text| test_result_in(&text))
}

/// Status of a step log; unreadable logs are [`StepStatus::Error`]
pub fn infer_status(path: &Path, heuristics: &StatusHeuristics) -> StepStatus {
    match read_text(path) {
        Ok(text) => status_of(test_result_in(&text).as_ref(), &text, heuristics),
        Err(e) => {
            log::warn!("Error reading {}: {}", path.display(), e);
            StepStatus::Error
        }
    }
}

fn summarize_step(run: &SanityRun, step: &str, heuristics: &StatusHeuristics) -> StepSummary {
    let path = run.step_log_path(step);
    let mut summary = StepSummary {
        step: step.to_string(),
        status: StepStatus::Missing,
        duration: None,
        result: None,
    };

    if !path.is_file() {
        return summary;
    }

    match read_text(&path) {
        Ok(text) => {
            summary.duration = duration_in(&text);
            summary.result = test_result_in(&text);
            summary.status = status_of(summary.result.as_ref(), &text, heuristics);
        }
        Err(e) => {
            log::warn!("Error reading {}: {}", path.display(), e);
            summary.status = StepStatus::Error;
        }
    }
    summary
}

/// Summarize every step of `run`, in step order
pub fn summarize_run(run: &SanityRun, heuristics: &StatusHeuristics) -> RunSummary {
    let steps: Vec<StepSummary> = run
        .step_logs
        .iter()
        .map(|step| summarize_step(run, step, heuristics))
        .collect();

    let timed: Vec<f64> = steps.iter().filter_map(StepSummary::duration_seconds).collect();
    let total = TotalDuration {
        seconds: timed.iter().sum(),
        contributing: timed.len(),
        steps: run.step_logs.len(),
    };

    RunSummary {
        run: run.name.clone(),
        steps,
        total,
    }
}
