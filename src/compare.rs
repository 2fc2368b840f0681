//! Structural comparison of two runs.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::run::SanityRun;

const MISSING: &str = "MISSING";

/// A component whose version differs between two runs.
/// `None` means the run does not list the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDiff {
    pub name: String,
    pub a: Option<String>,
    pub b: Option<String>,
}

/// Structural difference between two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunComparison {
    pub run_a: String,
    pub run_b: String,
    /// Absolute difference, when both runs are timestamped
    pub time_difference_secs: Option<i64>,
    /// Sorted by component name
    pub components: Vec<ComponentDiff>,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
}

impl RunComparison {
    pub fn steps_match(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty()
    }
}

impl fmt::Display for RunComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comparing {} vs {}", self.run_a, self.run_b)?;
        writeln!(f, "{}", "=".repeat(80))?;
        if let Some(secs) = self.time_difference_secs {
            writeln!(f, "Time difference: {} seconds", secs)?;
        }

        writeln!(f)?;
        writeln!(f, "Component differences:")?;
        for diff in &self.components {
            writeln!(f, "  {}:", diff.name)?;
            writeln!(f, "    {}: {}", self.run_a, diff.a.as_deref().unwrap_or(MISSING))?;
            writeln!(f, "    {}: {}", self.run_b, diff.b.as_deref().unwrap_or(MISSING))?;
        }

        writeln!(f)?;
        writeln!(f, "Step differences:")?;
        if !self.only_in_a.is_empty() {
            writeln!(f, "  Only in {}: {}", self.run_a, self.only_in_a.join(", "))?;
        }
        if !self.only_in_b.is_empty() {
            writeln!(f, "  Only in {}: {}", self.run_b, self.only_in_b.join(", "))?;
        }
        if self.steps_match() {
            writeln!(f, "  No step differences found.")?;
        }
        Ok(())
    }
}

/// Diff the component versions and step sets of two runs
pub fn compare(a: &SanityRun, b: &SanityRun) -> RunComparison {
    let time_difference_secs = match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => Some((ta - tb).num_seconds().abs()),
        _ => None,
    };

    let names: BTreeSet<&str> = a.components.names().chain(b.components.names()).collect();
    let components = names
        .into_iter()
        .filter_map(|name| {
            let va = a.components.get(name);
            let vb = b.components.get(name);
            (va != vb).then(|| ComponentDiff {
                name: name.to_string(),
                a: va.map(str::to_string),
                b: vb.map(str::to_string),
            })
        })
        .collect();

    RunComparison {
        run_a: a.name.clone(),
        run_b: b.name.clone(),
        time_difference_secs,
        components,
        only_in_a: a.step_logs.difference(&b.step_logs).cloned().collect(),
        only_in_b: b.step_logs.difference(&a.step_logs).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{Components, MASTER_LOG, parse_run_timestamp};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn run(name: &str, components: &[(&str, &str)], steps: &[&str]) -> SanityRun {
        let path = PathBuf::from("/tmp/sanity").join(name);
        SanityRun {
            name: name.to_string(),
            timestamp: parse_run_timestamp(name),
            components: components.iter().copied().collect::<Components>(),
            step_logs: steps.iter().map(|s| s.to_string()).collect(),
            master_log: path.join(MASTER_LOG),
            path,
        }
    }

    #[test]
    fn test_version_change_only() {
        let a = run("20250101_000000", &[("libfoo", "1.0")], &["build", "test"]);
        let b = run("20250101_000100", &[("libfoo", "2.0")], &["build", "test"]);
        let diff = compare(&a, &b);

        assert_eq!(diff.time_difference_secs, Some(60));
        assert_eq!(
            diff.components,
            vec![ComponentDiff {
                name: "libfoo".to_string(),
                a: Some("1.0".to_string()),
                b: Some("2.0".to_string()),
            }]
        );
        assert!(diff.steps_match());
    }

    #[test]
    fn test_missing_components_and_steps() {
        let a = run("nightly", &[("zlib", "1.3"), ("same", "x")], &["build", "lint"]);
        let b = run("20250101_000000", &[("same", "x"), ("abc", "9")], &["build", "test"]);
        let diff = compare(&a, &b);

        assert_eq!(diff.time_difference_secs, None);
        assert_eq!(
            diff.to_string(),
            format!(
                "Comparing nightly vs 20250101_000000\n{}\n\
                 \nComponent differences:\n  abc:\n    nightly: MISSING\n    20250101_000000: 9\n\
                 \x20 zlib:\n    nightly: 1.3\n    20250101_000000: MISSING\n\
                 \nStep differences:\n  Only in nightly: lint\n  Only in 20250101_000000: test\n",
                "=".repeat(80)
            )
        );
    }

    #[test]
    fn test_identical_runs_report_no_differences() {
        let a = run("20250101_000000", &[("libfoo", "1.0")], &["build"]);
        let text = compare(&a, &a).to_string();
        assert!(text.contains("Time difference: 0 seconds"));
        assert!(text.ends_with("Step differences:\n  No step differences found.\n"));
    }
}
