pub mod logging;
pub mod paths;
pub mod system;

// Re-export commonly used functions
pub use logging::{log_message, LogLevel};
pub use paths::{env_or_defaults, find_handler, handler_file_name, join_paths};
pub use system::{detect_os, probe_environment};
