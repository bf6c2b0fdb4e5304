use std::process::Command;

use crate::components::Component;
use crate::core::types::Status;
use crate::utils::system::which_binary;

/// Seam between status detection and the host. The live implementation
/// shells out; tests inject a fake.
pub trait SystemProbe {
    /// Absolute path of a binary if it is on the execution path.
    fn binary_path(&self, binary: &str) -> Option<String>;

    /// Whether the service manager reports the unit as active. Unknown
    /// units and probe errors count as inactive.
    fn service_active(&self, unit: &str) -> bool;

    /// Raw output of the binary's version invocation, stdout and stderr
    /// combined (nginx and sshd print theirs to stderr).
    fn version_output(&self, binary: &str, args: &[&str]) -> Option<String>;
}

/// Probe implementation backed by `which` and `systemctl`.
pub struct LiveSystem;

impl SystemProbe for LiveSystem {
    fn binary_path(&self, binary: &str) -> Option<String> {
        which_binary(binary)
    }

    fn service_active(&self, unit: &str) -> bool {
        Command::new("systemctl")
            .args(["is-active", unit])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim() == "active")
            .unwrap_or(false)
    }

    fn version_output(&self, binary: &str, args: &[&str]) -> Option<String> {
        let output = Command::new(binary).args(args).output().ok()?;
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Some(text)
    }
}

/// Build a fresh Status for one component. Read-only: never touches the
/// component's handler, never mutates the system.
pub fn component_status(probe: &dyn SystemProbe, component: &Component) -> Status {
    let check = match &component.check {
        Some(check) => check,
        None => return Status::absent(),
    };

    let installed = probe.binary_path(check.binary).is_some();
    if !installed {
        return Status::absent();
    }

    let active = check
        .service
        .map(|unit| probe.service_active(unit))
        .unwrap_or(false);

    let version = probe
        .version_output(check.binary, check.version_args)
        .and_then(|output| parse_version(&output));

    Status {
        installed,
        active,
        version,
    }
}

/// Best-effort extraction of a dotted version number from arbitrary
/// `--version`-style output. None when nothing version-shaped appears.
pub fn parse_version(output: &str) -> Option<String> {
    output
        .split(|c: char| c.is_whitespace() || c == '/' || c == '_' || c == ',')
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit()))
        .find(|token| {
            token.contains('.')
                && token.chars().next().map_or(false, |c| c.is_ascii_digit())
        })
        .map(|token| token.to_string())
}
