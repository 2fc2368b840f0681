//! Integration tests over run directories built on disk

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sanity_logs::{Config, LogViewer, MemoryPager, RangeSpec, StepStatus, ViewerError};

/// Create a run directory with the given files
fn make_run(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("Failed to create run dir");
    for (file, content) in files {
        fs::write(dir.join(file), content).expect("Failed to write run file");
    }
    dir
}

fn viewer(root: &Path) -> LogViewer {
    LogViewer::new(Config {
        sanity_dir: root.to_path_buf(),
        ..Config::defaults()
    })
}

#[test]
fn test_show_components_and_steps() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[
            ("components.txt", "libfoo=1.2.3\nbarrepo [type=src, revision=abcdef]\n"),
            ("test_log.txt", "1 testing\n"),
            ("build_log.txt", "1 building\n"),
            ("master_log.txt", "1 start\n"),
        ],
    );

    let viewer = viewer(root.path());
    let details = viewer.show("20250101").unwrap();
    let run = details.run();

    assert_eq!(run.components.get("libfoo"), Some("1.2.3"));
    assert_eq!(run.components.get("barrepo"), Some("abcdef"));
    assert_eq!(run.step_logs.iter().collect::<Vec<_>>(), vec!["build", "test"]);
    assert_eq!(
        details.to_string(),
        "Sanity Run: 20250101_000000\n\
         Timestamp: 2025-01-01 00:00:00\n\
         \n\
         Components:\n  libfoo: 1.2.3\n  barrepo: abcdef\n\
         \n\
         Test Steps:\n  - build\n  - test\n"
    );
}

#[test]
fn test_summary_reads_overall_result() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[(
            "test_log.txt",
            "1 running\nOverall result: FAIL total=10 failures=2 errors=0 skipped=0 not_applicable=0 soundCardFailures=0\nTotal duration: 12.5s\n",
        )],
    );

    let summary = viewer(root.path()).summary("20250101_000000").unwrap();
    let row = &summary.steps[0];
    assert_eq!(row.status, StepStatus::Failed);
    let result = row.result.as_ref().unwrap();
    assert_eq!(result.failures, 2);
    assert_eq!(result.total, 10);
    assert_eq!(row.duration.as_deref(), Some("12.5s"));
}

#[test]
fn test_summary_aggregates_parsed_durations() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[
            ("a_log.txt", "Total duration: 30.25s\n"),
            ("b_log.txt", "Total duration: 45.5s\nall done\n"),
            ("c_log.txt", "no timing here\n"),
        ],
    );

    let summary = viewer(root.path()).summary("20250101_000000").unwrap();
    let expected: f64 = summary.steps.iter().filter_map(|s| s.duration_seconds()).sum();
    assert_eq!(summary.total.seconds, expected);
    assert_eq!(summary.total.seconds, 75.75);
    assert_eq!(summary.total.contributing, 2);
    assert_eq!(summary.total.steps, 3);
    assert!(summary.to_string().ends_with(
        "Total Duration: 1m 15.75s (75.75s total)\nSteps with timing: 2/3\n"
    ));
}

#[test]
fn test_summary_without_timing() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "20250101_000000", &[("a_log.txt", "build failed\n")]);

    let summary = viewer(root.path()).summary("20250101_000000").unwrap();
    assert_eq!(summary.steps[0].status, StepStatus::Failed);
    assert!(summary.to_string().ends_with("Total Duration: No timing information available\n"));
}

#[test]
fn test_compare_component_versions() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[("components.txt", "libfoo=1.0\n"), ("build_log.txt", "")],
    );
    make_run(
        root.path(),
        "20250102_000000",
        &[("components.txt", "libfoo=2.0\n"), ("build_log.txt", "")],
    );

    let diff = viewer(root.path())
        .compare("20250101_000000", "20250102_000000")
        .unwrap();
    assert_eq!(diff.time_difference_secs, Some(86400));
    assert_eq!(diff.components.len(), 1);
    assert_eq!(diff.components[0].name, "libfoo");
    assert_eq!(diff.components[0].a.as_deref(), Some("1.0"));
    assert_eq!(diff.components[0].b.as_deref(), Some("2.0"));
    assert!(diff.only_in_a.is_empty());
    assert!(diff.only_in_b.is_empty());
    assert!(diff.to_string().contains("  No step differences found.\n"));
}

#[test]
fn test_search_highlights_across_logs() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[("disk_log.txt", "4 all good\n5 error: disk full\n")],
    );

    let report = viewer(root.path())
        .search("20250101_000000", None, "ERROR", false)
        .unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].log, "disk");
    assert_eq!(report.groups[0].hits[0].highlighted, "**error**: disk full");
    assert_eq!(report.groups[0].hits[0].content, "error: disk full");
    assert_eq!(
        report.to_string(),
        "\n=== disk log (1 matches) ===\n    5: **error**: disk full\n\nTotal matches: 1\n"
    );
}

#[test]
fn test_search_master_log_comes_last() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[
            ("master_log.txt", "1 timeout in master\n"),
            ("zeta_log.txt", "1 timeout in zeta\n"),
            ("alpha_log.txt", "1 timeout in alpha\n2 TIMEOUT again\n"),
        ],
    );

    let report = viewer(root.path())
        .search("20250101_000000", None, "timeout", true)
        .unwrap();
    let groups: Vec<_> = report.groups.iter().map(|g| (g.log.as_str(), g.hits.len())).collect();
    assert_eq!(groups, vec![("alpha", 1), ("zeta", 1), ("master", 1)]);
    assert_eq!(report.total, 3);
}

#[test]
fn test_search_invalid_pattern_is_reported() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "20250101_000000", &[("a_log.txt", "1 x\n")]);

    let err = viewer(root.path())
        .search("20250101_000000", None, "[unclosed", false)
        .unwrap_err();
    assert!(matches!(err, ViewerError::InvalidPattern(_)));
    assert!(err.to_string().starts_with("Invalid search pattern:"));
}

#[test]
fn test_view_ranges() {
    let root = TempDir::new().unwrap();
    let master: String = (1..=40).map(|n| format!("{} line {}\n", n, n)).collect();
    make_run(root.path(), "20250101_000000", &[("master_log.txt", master.as_str())]);
    let viewer = viewer(root.path());

    let span = viewer.view("20250101_000000", None, Some("10:20")).unwrap();
    assert_eq!(span.rendered.lines.len(), 11);
    assert_eq!(span.rendered.lines[0], "   10 line 10");
    assert_eq!(span.rendered.lines[10], "   20 line 20");

    let head = viewer.view("20250101_000000", None, Some("20")).unwrap();
    assert_eq!(head.range, RangeSpec::Head(20));
    assert_eq!(head.rendered.lines.len(), 20);
    assert!(head.rendered.footer.as_deref().unwrap().contains("showing first 20 lines"));

    let tail = viewer.view("20250101_000000", None, Some("35:")).unwrap();
    assert_eq!(tail.rendered.lines.len(), 6);
}

#[test]
fn test_view_pages_only_whole_logs() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "20250101_000000", &[("master_log.txt", "1 one\n2 two\n")]);
    let viewer = viewer(root.path());
    let mut pager = MemoryPager::new();

    let whole = viewer.view("20250101_000000", None, None).unwrap();
    let mut out = Vec::new();
    viewer.present(&whole, Some(&mut pager), &mut out).unwrap();
    assert!(out.is_empty());

    let ranged = viewer.view("20250101_000000", None, Some("1")).unwrap();
    viewer.present(&ranged, Some(&mut pager), &mut out).unwrap();
    assert_eq!(pager.pages().len(), 1);
    assert!(String::from_utf8(out).unwrap().contains("    1 one\n"));
}

#[test]
fn test_missing_master_log() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "20250101_000000", &[("a_log.txt", "1 x\n")]);

    let err = viewer(root.path()).view("20250101_000000", None, None).unwrap_err();
    assert!(matches!(err, ViewerError::LogNotFound(_)));
}

#[test]
fn test_ambiguous_and_unknown_runs() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "20250101_000000", &[]);
    make_run(root.path(), "20250102_000000", &[]);
    let viewer = viewer(root.path());

    match viewer.show("2025") {
        Err(ViewerError::AmbiguousRun { candidates, .. }) => {
            assert_eq!(candidates, vec!["20250102_000000", "20250101_000000"]);
        }
        other => panic!("expected ambiguity, got {:?}", other.map(|d| d.run().name.clone())),
    }
    assert!(matches!(viewer.show("1999"), Err(ViewerError::RunNotFound(_))));
    assert_eq!(viewer.show("20250102").unwrap().run().name, "20250102_000000");
}

#[test]
fn test_list_orders_newest_first() {
    let root = TempDir::new().unwrap();
    make_run(root.path(), "nightly", &[]);
    make_run(root.path(), "20250101_000000", &[("a_log.txt", "")]);
    make_run(root.path(), "20250301_120000_rerun", &[]);

    let text = viewer(root.path()).list().to_string();
    assert_eq!(
        text,
        "Found 3 sanity run(s):\n\n\
         \x201. 20250301_120000_rerun (2025-03-01 12:00:00) - 0 steps\n\
         \x202. 20250101_000000 (2025-01-01 00:00:00) - 1 steps\n\
         \x203. nightly (Unknown) - 0 steps\n"
    );
}

#[test]
fn test_filter_step_log() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[(
            "build_log.txt",
            "1 \x1b[1;32mINFO\x1b[0m start\n2 \x1b[1;33mWARNING\x1b[0m slow disk\n",
        )],
    );

    let report = viewer(root.path())
        .filter("20250101_000000", "warning", Some("build"))
        .unwrap();
    assert_eq!(report.count, 1);
    assert!(report.to_string().ends_with("\nFound 1 warning messages.\n"));
}

#[test]
fn test_json_output_shapes() {
    let root = TempDir::new().unwrap();
    make_run(
        root.path(),
        "20250101_000000",
        &[("components.txt", "libfoo=1.0\n"), ("a_log.txt", "Total duration: 3s\n")],
    );
    let viewer = viewer(root.path());

    let list = serde_json::to_value(viewer.list()).unwrap();
    assert_eq!(list[0]["name"], "20250101_000000");
    assert_eq!(list[0]["timestamp"], "2025-01-01T00:00:00");
    assert_eq!(list[0]["components"][0][0], "libfoo");

    let summary = serde_json::to_value(viewer.summary("20250101_000000").unwrap()).unwrap();
    assert_eq!(summary["steps"][0]["status"], "COMPLETED");
    assert_eq!(summary["steps"][0]["duration"], "3s");
}
