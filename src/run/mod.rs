pub mod metadata;
pub mod registry;
pub mod types;

pub use metadata::{COMPONENTS_FILE, discover_step_logs, load_components, parse_components, parse_run_timestamp};
pub use registry::{RunRegistry, discover_runs};
pub use types::{Components, MASTER_LABEL, MASTER_LOG, STEP_LOG_SUFFIX, SanityRun};
