use std::error::Error;
use std::fmt;
use std::io;

/// Custom error type for better error handling.
///
/// Environment variants are fatal: they abort the process before any menu
/// is shown. Everything else is local to a single action or menu iteration.
#[derive(Debug)]
pub enum SetupError {
    OsUndetectable(String),
    NotRoot,
    NoFetchTool,
    FetchFailed { url: String, reason: String },
    HandlerNotFound { component: String, searched: String },
    UnresolvedHandler { component: String, reason: String },
    UnsupportedVerb { component: String, verb: &'static str },
    ExecutionFailed(String),
    IoError(io::Error),
}

impl SetupError {
    /// Fatal errors terminate the process; the rest are reported and the
    /// current menu or batch continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SetupError::OsUndetectable(_) | SetupError::NotRoot | SetupError::NoFetchTool
        )
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupError::OsUndetectable(msg) => {
                write!(f, "Cannot determine operating system: {}", msg)
            }
            SetupError::NotRoot => write!(f, "This program must be run as root"),
            SetupError::NoFetchTool => {
                write!(f, "Neither curl nor wget is available on PATH")
            }
            SetupError::FetchFailed { url, reason } => {
                write!(f, "Fetch failed for {}: {}", url, reason)
            }
            SetupError::HandlerNotFound {
                component,
                searched,
            } => write!(
                f,
                "Handler for '{}' not found locally (searched: {})",
                component, searched
            ),
            SetupError::UnresolvedHandler { component, reason } => {
                write!(f, "Could not resolve handler for '{}': {}", component, reason)
            }
            SetupError::UnsupportedVerb { component, verb } => {
                write!(f, "Component '{}' does not support '{}'", component, verb)
            }
            SetupError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            SetupError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SetupError {}

impl From<io::Error> for SetupError {
    fn from(err: io::Error) -> Self {
        SetupError::IoError(err)
    }
}

/// Result type alias for cleaner code
pub type SetupResult<T> = Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_errors_are_fatal() {
        assert!(SetupError::NotRoot.is_fatal());
        assert!(SetupError::NoFetchTool.is_fatal());
        assert!(SetupError::OsUndetectable("gone".to_string()).is_fatal());
    }

    #[test]
    fn component_errors_are_not_fatal() {
        let fetch = SetupError::FetchFailed {
            url: "https://example.invalid/stable/firewall.sh".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(!fetch.is_fatal());
        assert!(!SetupError::UnsupportedVerb {
            component: "firewall".to_string(),
            verb: "run",
        }
        .is_fatal());
    }

    #[test]
    fn fetch_error_carries_exact_url() {
        let err = SetupError::FetchFailed {
            url: "https://example.invalid/stable/firewall.sh".to_string(),
            reason: "exit status 22".to_string(),
        };
        assert!(err
            .to_string()
            .contains("https://example.invalid/stable/firewall.sh"));
    }
}
