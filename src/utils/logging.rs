use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use atty::Stream;
use once_cell::sync::Lazy;

static COLOR_ENABLED: Lazy<AtomicBool> = Lazy::new(|| {
    let enabled = atty::is(Stream::Stdout) && std::env::var_os("NO_COLOR").is_none();
    AtomicBool::new(enabled)
});

const RESET: &str = "\x1b[0m";

/// Log levels for colored console output
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Pass,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn color_code(&self) -> &'static str {
        match self {
            Self::Pass => "\x1b[1;32m",    // Green
            Self::Info => "\x1b[1;34m",    // Blue
            Self::Warning => "\x1b[1;33m", // Yellow
            Self::Error => "\x1b[1;31m",   // Red
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Pass => "[PASS]",
            Self::Info => "[INFO]",
            Self::Warning => "[WARNING]",
            Self::Error => "[ERROR]",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if COLOR_ENABLED.load(Ordering::Relaxed) {
            write!(f, "{}{}{}", self.color_code(), self.prefix(), RESET)
        } else {
            f.write_str(self.prefix())
        }
    }
}

pub fn log_message(level: LogLevel, message: &str) {
    println!("{} {}", level, message);
}
