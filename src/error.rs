use std::path::PathBuf;
use thiserror::Error;

/// Result type for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors surfaced to the user by viewer operations.
///
/// None of these are fatal to the engine; the caller decides how to report
/// them and what exit status to use.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Run \"{0}\" not found.")]
    RunNotFound(String),

    /// More than one run contains the requested partial name
    #[error("Multiple runs match \"{query}\":\n{}", format_candidates(.candidates))]
    AmbiguousRun {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Step \"{step}\" not found in run \"{run}\".\nAvailable steps: {}", .available.join(", "))]
    StepNotFound {
        step: String,
        run: String,
        available: Vec<String>,
    },

    #[error("Log file not found: {}", .0.display())]
    LogNotFound(PathBuf),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid line specification: {0}")]
    InvalidRange(String),

    #[error("Error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ViewerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewerError::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|name| format!("  {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}
