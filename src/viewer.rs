//! Query façade over the discovered runs.
//!
//! Every operation resolves its run identifier through the registry and
//! returns a result value. Results implement `Display` for the plain-text
//! layout and `Serialize` for `--json` output.

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::compare::{RunComparison, compare};
use crate::config::Config;
use crate::error::ViewerResult;
use crate::logfile::{
    LevelReport, RangeSpec, Rendered, SearchReport, SearchScope, StepHeader, filter_by_level,
    outline, render, search_run,
};
use crate::pager::Pager;
use crate::run::{MASTER_LABEL, RunRegistry, SanityRun};
use crate::summary::{RunSummary, summarize_run};

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Discovered runs, newest first
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RunList<'a> {
    runs: &'a [SanityRun],
}

impl RunList<'_> {
    pub fn runs(&self) -> &[SanityRun] {
        self.runs
    }
}

impl fmt::Display for RunList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.runs.is_empty() {
            return writeln!(f, "No sanity runs found.");
        }
        writeln!(f, "Found {} sanity run(s):", self.runs.len())?;
        writeln!(f)?;
        for (i, run) in self.runs.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, run)?;
        }
        Ok(())
    }
}

/// Components and steps of one run
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RunDetails<'a> {
    run: &'a SanityRun,
}

impl RunDetails<'_> {
    pub fn run(&self) -> &SanityRun {
        self.run
    }
}

impl fmt::Display for RunDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sanity Run: {}", self.run.name)?;
        writeln!(f, "Timestamp: {}", self.run.timestamp_display())?;
        writeln!(f)?;
        writeln!(f, "Components:")?;
        for (name, version) in self.run.components.iter() {
            writeln!(f, "  {}: {}", name, version)?;
        }
        writeln!(f)?;
        writeln!(f, "Test Steps:")?;
        for step in &self.run.step_logs {
            writeln!(f, "  - {}", step)?;
        }
        Ok(())
    }
}

/// A rendered log ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogView {
    pub run: String,
    /// Step name or `master`
    pub log: String,
    pub path: PathBuf,
    pub range: RangeSpec,
    #[serde(flatten)]
    pub rendered: Rendered,
}

impl LogView {
    pub fn title(&self) -> String {
        format!("Viewing {} log from {}", self.log, self.run)
    }

    /// Text handed to a pager
    pub fn page_text(&self) -> String {
        format!("{}\n{}\n\n{}", self.title(), rule(), self.rendered)
    }
}

impl fmt::Display for LogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        writeln!(f, "{}", rule())?;
        write!(f, "{}", self.rendered)
    }
}

/// Step header candidates of one log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub run: String,
    pub log: String,
    pub headers: Vec<StepHeader>,
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Step headers in {} log from {}", self.log, self.run)?;
        writeln!(f, "{}", rule())?;
        if self.headers.is_empty() {
            return writeln!(f, "No step headers found.");
        }
        for header in &self.headers {
            writeln!(f, "{:>6}: {}", header.line, header.name)?;
        }
        Ok(())
    }
}

/// Answers queries over the runs under one sanity root
#[derive(Debug, Clone)]
pub struct LogViewer {
    registry: RunRegistry,
    config: Config,
}

impl LogViewer {
    /// Discover runs under the configured sanity root
    pub fn new(config: Config) -> Self {
        let registry = RunRegistry::discover(&config.sanity_dir);
        Self { registry, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, name: &str) -> ViewerResult<&SanityRun> {
        self.registry.resolve(name)
    }

    pub fn list(&self) -> RunList<'_> {
        RunList {
            runs: self.registry.runs(),
        }
    }

    pub fn show(&self, run: &str) -> ViewerResult<RunDetails<'_>> {
        Ok(RunDetails {
            run: self.run(run)?,
        })
    }

    /// Render the master log, or a step log, of a run.
    ///
    /// `lines` is a `--lines` value; an invalid one falls back to the
    /// configured line cap.
    pub fn view(&self, run: &str, step: Option<&str>, lines: Option<&str>) -> ViewerResult<LogView> {
        let run = self.run(run)?;
        let (log, path) = select_log(run, step)?;
        let range = RangeSpec::parse_or_cap(lines, self.config.view.default_line_cap);
        let rendered = render(&path, range)?;

        Ok(LogView {
            run: run.name.clone(),
            log,
            path,
            range,
            rendered,
        })
    }

    /// Write a view to `out`, through `pager` when one is given and the whole
    /// log was requested. A failing pager falls back to direct output.
    pub fn present(
        &self,
        view: &LogView,
        pager: Option<&mut dyn Pager>,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if let Some(pager) = pager.filter(|_| !view.range.is_explicit()) {
            match pager.display(&view.page_text()) {
                Ok(()) => return Ok(()),
                Err(e) => log::warn!("Error using pager: {}; falling back to direct display", e),
            }
        }
        write!(out, "{}", view)
    }

    /// Regex search over one step log or every log of a run
    pub fn search(
        &self,
        run: &str,
        step: Option<&str>,
        pattern: &str,
        case_sensitive: bool,
    ) -> ViewerResult<SearchReport> {
        let run = self.run(run)?;
        let scope = step.map_or(SearchScope::All, SearchScope::Step);
        search_run(run, scope, pattern, case_sensitive)
    }

    /// Lines of the master log, or a step log, carrying `level`
    pub fn filter(&self, run: &str, level: &str, step: Option<&str>) -> ViewerResult<LevelReport> {
        let run = self.run(run)?;
        let (log, path) = select_log(run, step)?;
        filter_by_level(&path, &log, level)
    }

    pub fn summary(&self, run: &str) -> ViewerResult<RunSummary> {
        let run = self.run(run)?;
        Ok(summarize_run(run, &self.config.status))
    }

    pub fn compare(&self, a: &str, b: &str) -> ViewerResult<RunComparison> {
        let a = self.run(a)?;
        let b = self.run(b)?;
        Ok(compare(a, b))
    }

    /// Step header candidates of the master log, or a step log
    pub fn outline(&self, run: &str, step: Option<&str>) -> ViewerResult<Outline> {
        let run = self.run(run)?;
        let (log, path) = select_log(run, step)?;
        Ok(Outline {
            run: run.name.clone(),
            headers: outline(&path)?,
            log,
        })
    }
}

/// Label and path of a step log, or of the master log when `step` is `None`
fn select_log(run: &SanityRun, step: Option<&str>) -> ViewerResult<(String, PathBuf)> {
    match step {
        Some(step) => Ok((step.to_string(), run.require_step(step)?)),
        None => Ok((MASTER_LABEL.to_string(), run.master_log.clone())),
    }
}
