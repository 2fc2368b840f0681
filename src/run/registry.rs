//! Run discovery and lookup.
//!
//! The registry is built once per invocation from the immediate
//! subdirectories of the sanity root. Runs are ordered newest first; runs
//! without a timestamp sort after every timestamped run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ViewerError, ViewerResult};
use crate::run::types::SanityRun;

/// All runs discovered under a sanity root
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Vec<SanityRun>,
}

impl RunRegistry {
    /// Discover every run under `root`. A missing root yields an empty registry.
    pub fn discover(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let runs = discover_runs(root);
        log::debug!("Discovered {} run(s) under {}", runs.len(), root.display());
        Self { runs }
    }

    /// Runs, newest first
    pub fn runs(&self) -> &[SanityRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Resolve a run by exact name, or by a partial name contained in exactly
    /// one run name.
    pub fn resolve(&self, name: &str) -> ViewerResult<&SanityRun> {
        if let Some(run) = self.runs.iter().find(|run| run.name == name) {
            return Ok(run);
        }

        let matches: Vec<&SanityRun> = self.runs.iter().filter(|run| run.name.contains(name)).collect();
        match matches.as_slice() {
            [] => Err(ViewerError::RunNotFound(name.to_string())),
            [run] => Ok(*run),
            _ => Err(ViewerError::AmbiguousRun {
                query: name.to_string(),
                candidates: matches.iter().map(|run| run.name.clone()).collect(),
            }),
        }
    }
}

/// Load one run per subdirectory of `root`, newest first
pub fn discover_runs(root: &Path) -> Vec<SanityRun> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("No runs under {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    // Stable base order for runs that tie on timestamp
    dirs.sort();

    let mut runs: Vec<SanityRun> = dirs.into_iter().map(SanityRun::load).collect();
    sort_runs(&mut runs);
    runs
}

/// Newest first; `None` compares below every timestamp so untimestamped
/// runs land at the end. The sort is stable.
fn sort_runs(runs: &mut [SanityRun]) {
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_with(names: &[&str]) -> (TempDir, RunRegistry) {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let registry = RunRegistry::discover(dir.path());
        (dir, registry)
    }

    fn names(registry: &RunRegistry) -> Vec<&str> {
        registry.runs().iter().map(|run| run.name.as_str()).collect()
    }

    #[test]
    fn test_discover_orders_newest_first_untimestamped_last() {
        let (_dir, registry) = registry_with(&[
            "20250101_000000",
            "manual",
            "20250301_120000_retry",
            "20250201_000000",
            "adhoc",
        ]);
        assert_eq!(
            names(&registry),
            vec![
                "20250301_120000_retry",
                "20250201_000000",
                "20250101_000000",
                "adhoc",
                "manual"
            ]
        );
    }

    #[test]
    fn test_discover_ignores_files_and_missing_root() {
        let (dir, _) = registry_with(&["20250101_000000"]);
        fs::write(dir.path().join("stray.txt"), "x").unwrap();
        let registry = RunRegistry::discover(dir.path());
        assert_eq!(names(&registry), vec!["20250101_000000"]);

        let missing = RunRegistry::discover(dir.path().join("nope"));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_resolve_exact_wins_over_partial() {
        let (_dir, registry) = registry_with(&["20250101_000000", "20250101_000000_b"]);
        let run = registry.resolve("20250101_000000").unwrap();
        assert_eq!(run.name, "20250101_000000");
    }

    #[test]
    fn test_resolve_unique_partial() {
        let (_dir, registry) = registry_with(&["20250101_000000", "20250202_000000"]);
        assert_eq!(registry.resolve("0202").unwrap().name, "20250202_000000");
    }

    #[test]
    fn test_resolve_ambiguous_lists_candidates() {
        let (_dir, registry) = registry_with(&["20250101_000000", "20250202_000000", "other"]);
        match registry.resolve("2025") {
            Err(ViewerError::AmbiguousRun { query, candidates }) => {
                assert_eq!(query, "2025");
                assert_eq!(candidates, vec!["20250202_000000", "20250101_000000"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_not_found() {
        let (_dir, registry) = registry_with(&["20250101_000000"]);
        assert!(matches!(
            registry.resolve("2030"),
            Err(ViewerError::RunNotFound(name)) if name == "2030"
        ));
    }
}
