// varwatch - util/constants.rs
//
// Single source of truth for all named constants, markers, limits, and
// defaults. Every on-disk name and polling cadence the tool depends on is
// defined here so the external analyser's layout contract is auditable in
// one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "varwatch";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Analyser on-disk layout
// =============================================================================

/// Substring identifying an analyser workspace directory under the temp root.
/// The analyser creates one such transient directory per run.
pub const WORKSPACE_TOKEN: &str = "a3c-";

/// Subdirectory inside a workspace that holds the analyser's log files.
pub const PERSISTENT_DIR_NAME: &str = "persistent";

/// Analysis log whose presence marks a workspace as initialised. The
/// analyser creates it early in the run; workspaces without it are skipped.
pub const ANALYSIS_LOG_NAME: &str = "astree.log";

/// The append-only log artifact that contains the data dictionary.
pub const ARTIFACT_NAME: &str = "log.txt";

/// Suffix appended to a workspace directory name during the rename-based
/// liveness probe. The round-trip rename is immediately reversed.
pub const PROBE_RENAME_SUFFIX: &str = "_";

// =============================================================================
// Readiness markers
// =============================================================================

/// Line marker opening the data-dictionary section of the artifact.
pub const DICT_START_MARKER: &str = "#data-dictionary-start";

/// Marker written once the analyser has produced its result summary.
pub const RESULT_SUMMARY_MARKER: &str = "/* Result summary */";

/// Marker terminating the data-dictionary section (normal completion).
pub const SHARED_MEMORY_MARKER: &str = "#shared memory usage:";

/// Alternate section terminator emitted when the analyser raises an alarm.
pub const ALARM_MARKER: &str = "#ALARM";

// =============================================================================
// Declaration line tokens
// =============================================================================

/// Token separating a variable's name from its declared type.
pub const TYPE_TOKEN: &str = "of type";

/// Token separating a variable's type from its range expression. The *last*
/// occurrence in the tail is the separator, so type names containing the
/// letters "in" (e.g. `int`) parse correctly.
pub const RANGE_TOKEN: &str = "in";

// =============================================================================
// Output files
// =============================================================================

/// Name of the extracted variable table written into the output directory.
pub const OUTPUT_FILE_NAME: &str = "variable_access.csv";

/// Name of the linker's output table (variable-to-source comments).
pub const LINKED_OUTPUT_FILE_NAME: &str = "linked_variables.csv";

/// CSV header row of the extracted variable table.
pub const OUTPUT_HEADER: [&str; 3] = ["Variable Name", "Variable Type", "Variable Range"];

/// CSV header row of the linker's output table.
pub const LINKED_OUTPUT_HEADER: [&str; 4] = [
    "Variable Name",
    "Variable Type",
    "Variable Range",
    "Source Comment",
];

// =============================================================================
// Polling cadences and budgets
// =============================================================================

/// Interval between workspace discovery attempts (ms).
pub const DEFAULT_DISCOVERY_RETRY_MS: u64 = 5_000;

/// Overall wall-clock budget for workspace discovery (seconds). If no live
/// workspace is resolved within this budget the monitor terminates without
/// producing output.
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 60;

/// Coarse poll interval (ms) used while the data-dictionary section has not
/// yet begun.
pub const DEFAULT_COARSE_POLL_MS: u64 = 3_000;

/// Fine poll interval (ms) used once the data-dictionary section is being
/// written. Polling tightens because data is actively streaming in.
pub const DEFAULT_FINE_POLL_MS: u64 = 300;

/// Minimum user-configurable discovery retry interval (ms).
pub const MIN_DISCOVERY_RETRY_MS: u64 = 100;

/// Maximum user-configurable discovery retry interval (ms).
pub const MAX_DISCOVERY_RETRY_MS: u64 = 60_000;

/// Maximum user-configurable discovery timeout (seconds).
pub const MAX_DISCOVERY_TIMEOUT_SECS: u64 = 3_600;

/// Minimum user-configurable poll interval (ms), shared by both cadences.
pub const MIN_POLL_MS: u64 = 10;

/// Maximum user-configurable poll interval (ms), shared by both cadences.
pub const MAX_POLL_MS: u64 = 60_000;

// =============================================================================
// Linker limits
// =============================================================================

/// Maximum size of a C source file accepted by the linker (bytes).
/// Generated source files can be large; 64 MiB is far beyond anything the
/// analyser front end accepts, so hitting this indicates the wrong input.
pub const MAX_SOURCE_FILE_SIZE: u64 = 64 * 1024 * 1024;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
