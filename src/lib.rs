//! Sanity Logs - navigate and analyze sanity test run logs.
//!
//! This crate provides:
//! - Discovery of timestamped run directories and their component manifests
//! - Log line parsing with timestamp and level extraction
//! - Ranged viewing, regex search and level filtering of step logs
//! - Per-step status and timing summaries
//! - Run-to-run comparison of components and steps
//!
//! # Example
//!
//! ```rust,no_run
//! use sanity_logs::{Config, LogViewer};
//!
//! let viewer = LogViewer::new(Config::from_env());
//! println!("{}", viewer.list());
//! println!("{}", viewer.summary("20250825").unwrap());
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod logfile;
pub mod pager;
pub mod run;
pub mod summary;
pub mod viewer;

// Re-export configuration and errors
pub use config::{Config, StatusHeuristics};
pub use error::{ViewerError, ViewerResult};

// Re-export run discovery
pub use run::{Components, RunRegistry, SanityRun};

// Re-export log queries
pub use logfile::{LevelReport, LogLine, RangeSpec, Rendered, SearchReport, SearchScope, parse_line};

// Re-export run analysis
pub use compare::{ComponentDiff, RunComparison, compare};
pub use summary::{RunSummary, StepResult, StepStatus, StepSummary, summarize_run};

// Re-export presentation
pub use pager::{CommandPager, MemoryPager, Pager, PagerError};
pub use viewer::{LogView, LogViewer, Outline, RunDetails, RunList};
