/// Application version - single source of truth
pub const VERSION: &str = "1.4.2";

/// Application name
pub const APP_NAME: &str = "vpskit";

/// Default environment variable values
pub const DEFAULT_LOG_DIR: &str = "/var/log/vpskit";
pub const DEFAULT_LIB_DIR: &str = "/var/lib/vpskit";

/// Where the resolver caches handlers fetched in remote mode
pub const DEFAULT_CACHE_DIR: &str = "/var/lib/vpskit/handlers";

/// Persisted summary of the most recent batch run
pub const LAST_BATCH_FILE: &str = "/var/lib/vpskit/last_batch.json";

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Default directories to search for handler scripts
/// These are searched in order, with the first match being used
pub const DEFAULT_HANDLER_DIRS: &[&str] = &[
    "/usr/share/vpskit/handlers",       // Production: installed via package
    "/usr/local/share/vpskit/handlers", // Local installation
];

/// Environment overrides
pub const HANDLER_PATH_ENV: &str = "VPSKIT_HANDLER_PATH";
pub const CACHE_DIR_ENV: &str = "VPSKIT_CACHE_DIR";

/// Well-known variable a handler reads to skip its interactive prompts
pub const AUTO_CONFIRM_ENV: &str = "VPSKIT_ASSUME_YES";

/// Source root for remote handler resolution; the branch segment is
/// selectable via --branch
pub const REMOTE_BASE: &str = "https://raw.githubusercontent.com/vpskit/handlers";
pub const DEFAULT_BRANCH: &str = "stable";
