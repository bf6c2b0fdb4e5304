use std::fmt;

use serde::Serialize;

/// Closed set of operations a handler can be asked to perform.
/// Every component declares which subset it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Install,
    Uninstall,
    Configure,
    Status,
    Enable,
    Disable,
    Run,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Install => "install",
            Verb::Uninstall => "uninstall",
            Verb::Configure => "configure",
            Verb::Status => "status",
            Verb::Enable => "enable",
            Verb::Disable => "disable",
            Verb::Run => "run",
        }
    }

    pub fn parse(s: &str) -> Option<Verb> {
        match s {
            "install" => Some(Verb::Install),
            "uninstall" => Some(Verb::Uninstall),
            "configure" => Some(Verb::Configure),
            "status" => Some(Verb::Status),
            "enable" => Some(Verb::Enable),
            "disable" => Some(Verb::Disable),
            "run" => Some(Verb::Run),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the dispatcher may prompt or must pre-answer every confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Unattended,
}

/// Point-in-time state of one component. Built fresh on every query so it
/// always reflects the live system, never a stale memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub installed: bool,
    pub active: bool,
    pub version: Option<String>,
}

impl Status {
    /// The status of a component with no trace on the system.
    pub fn absent() -> Self {
        Status {
            installed: false,
            active: false,
            version: None,
        }
    }
}

/// Managed components are installed/configured packages with detectable
/// state; delegates are third-party interactive tools we only launch and
/// judge by exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Managed,
    Delegate,
}

/// Local installs ship every handler; a remote one-liner fetches handlers
/// on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Local,
    Remote,
}

/// Network fetch utility detected on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTool {
    Curl,
    Wget,
}

impl FetchTool {
    pub fn binary(&self) -> &'static str {
        match self {
            FetchTool::Curl => "curl",
            FetchTool::Wget => "wget",
        }
    }
}

/// OS identity parsed from /etc/os-release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    pub family: String,
    pub version: String,
    pub codename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_round_trips_through_its_name() {
        for verb in [
            Verb::Install,
            Verb::Uninstall,
            Verb::Configure,
            Verb::Status,
            Verb::Enable,
            Verb::Disable,
            Verb::Run,
        ] {
            assert_eq!(Verb::parse(verb.as_str()), Some(verb));
        }
        assert_eq!(Verb::parse("reinstall"), None);
    }
}
