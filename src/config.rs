//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the sanity log viewer, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults for the standard build output layout
//! - The keyword lists used by the step status fallback
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SANITY_LOGS_DIR` | Root directory holding run directories | `sanity` |
//! | `SANITY_LOGS_PAGER` | Pager program, optionally with arguments | `less -R`, else `more` |
//! | `SANITY_LOGS_NO_PAGER` | Disable paging (`1`, `true`, ...) | unset |
//! | `SANITY_LOGS_DEFAULT_LINES` | Line cap used for invalid `--lines` values | `50` |
//! | `SANITY_LOGS_STATUS_TAIL` | Trailing lines inspected when inferring a step status | `10` |
//!
//! # Example
//!
//! ```bash
//! # Point at a different build tree and page with `most`
//! export SANITY_LOGS_DIR="/srv/build/sanity"
//! export SANITY_LOGS_PAGER="most"
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default root directory for sanity runs
pub const DEFAULT_SANITY_DIR: &str = "sanity";

/// Default number of lines shown when a line specification cannot be parsed
pub const DEFAULT_LINE_CAP: usize = 50;

/// Default number of trailing lines inspected by the status fallback
pub const DEFAULT_STATUS_TAIL: usize = 10;

/// Preferred pager and its arguments
pub const PREFERRED_PAGER: &str = "less";
pub const PREFERRED_PAGER_ARGS: &[&str] = &["-R"];

/// Pager used when the preferred one is not installed
pub const FALLBACK_PAGER: &str = "more";

/// Marker that anchors the status fallback on a finished step
pub const DEFAULT_COMPLETION_MARKER: &str = "total duration:";

/// Phrases that mark a failed step near the end of its log
pub const DEFAULT_FAILURE_PHRASES: &[&str] = &["build failed", "compilation failed", "step failed"];

/// Phrases that mark a successful step near the end of its log
pub const DEFAULT_SUCCESS_PHRASES: &[&str] = &["done", "success", "completed successfully"];

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the sanity root directory
pub const ENV_SANITY_DIR: &str = "SANITY_LOGS_DIR";

/// Environment variable for the pager command
pub const ENV_PAGER: &str = "SANITY_LOGS_PAGER";

/// Environment variable disabling the pager
pub const ENV_NO_PAGER: &str = "SANITY_LOGS_NO_PAGER";

/// Environment variable for the invalid-range line cap
pub const ENV_DEFAULT_LINES: &str = "SANITY_LOGS_DEFAULT_LINES";

/// Environment variable for the status fallback window
pub const ENV_STATUS_TAIL: &str = "SANITY_LOGS_STATUS_TAIL";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for the viewer
#[derive(Debug, Clone)]
pub struct Config {
    /// Where runs are discovered
    pub sanity_dir: PathBuf,
    /// Pager configuration
    pub pager: PagerSettings,
    /// Log viewing defaults
    pub view: ViewSettings,
    /// Step status inference
    pub status: StatusHeuristics,
}

/// Pager-related settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerSettings {
    /// Explicit pager command (program followed by arguments), if configured
    pub command: Option<Vec<String>>,
    /// Whether paging is enabled at all
    pub enabled: bool,
}

/// Log viewing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    /// Line cap applied when a line specification is invalid
    pub default_line_cap: usize,
}

/// Keyword heuristics used to infer a step status when the log carries no
/// overall result line. All phrases are matched against case-folded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHeuristics {
    /// Number of trailing lines inspected
    pub tail_lines: usize,
    /// Phrase marking that the step ran to completion
    pub completion_marker: String,
    pub failure_phrases: Vec<String>,
    pub success_phrases: Vec<String>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            sanity_dir: env::var(ENV_SANITY_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SANITY_DIR)),
            pager: PagerSettings::from_env(),
            view: ViewSettings::from_env(),
            status: StatusHeuristics::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            sanity_dir: PathBuf::from(DEFAULT_SANITY_DIR),
            pager: PagerSettings::defaults(),
            view: ViewSettings::defaults(),
            status: StatusHeuristics::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PagerSettings {
    /// Create pager settings from environment variables
    pub fn from_env() -> Self {
        Self {
            command: env::var(ENV_PAGER).ok().and_then(|s| parse_command(&s)),
            enabled: !env::var(ENV_NO_PAGER).map(|s| is_truthy(&s)).unwrap_or(false),
        }
    }

    /// Create pager settings with defaults
    pub fn defaults() -> Self {
        Self {
            command: None,
            enabled: true,
        }
    }
}

impl ViewSettings {
    /// Create view settings from environment variables
    pub fn from_env() -> Self {
        Self {
            default_line_cap: env::var(ENV_DEFAULT_LINES)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|cap| *cap > 0)
                .unwrap_or(DEFAULT_LINE_CAP),
        }
    }

    /// Create view settings with defaults
    pub fn defaults() -> Self {
        Self {
            default_line_cap: DEFAULT_LINE_CAP,
        }
    }
}

impl StatusHeuristics {
    /// Default phrase lists with the tail window taken from the environment
    pub fn from_env() -> Self {
        Self {
            tail_lines: env::var(ENV_STATUS_TAIL)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STATUS_TAIL),
            ..Self::default()
        }
    }
}

impl Default for StatusHeuristics {
    fn default() -> Self {
        Self {
            tail_lines: DEFAULT_STATUS_TAIL,
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            failure_phrases: DEFAULT_FAILURE_PHRASES.iter().map(|s| s.to_string()).collect(),
            success_phrases: DEFAULT_SUCCESS_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Split a pager command line into program and arguments
fn parse_command(command: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() { None } else { Some(parts) }
}

/// Interpret a flag-like environment value
fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("less -R -S"),
            Some(vec!["less".to_string(), "-R".to_string(), "-S".to_string()])
        );
        assert_eq!(parse_command("most"), Some(vec!["most".to_string()]));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.sanity_dir, PathBuf::from(DEFAULT_SANITY_DIR));
        assert_eq!(config.view.default_line_cap, DEFAULT_LINE_CAP);
        assert!(config.pager.enabled);
        assert_eq!(config.pager.command, None);
    }

    #[test]
    fn test_status_heuristics_defaults() {
        let heuristics = StatusHeuristics::default();
        assert_eq!(heuristics.tail_lines, 10);
        assert_eq!(heuristics.completion_marker, "total duration:");
        assert!(heuristics.failure_phrases.contains(&"step failed".to_string()));
        assert!(heuristics.success_phrases.contains(&"done".to_string()));
    }
}
