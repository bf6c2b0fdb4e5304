use std::fs;
use std::process::Command;

use crate::core::error::{SetupError, SetupResult};
use crate::core::types::{FetchTool, OsIdentity};

/// OS families the handler scripts are written against. Anything else that
/// still carries a parsable /etc/os-release gets a warning, not a failure.
pub const SUPPORTED_FAMILIES: &[&str] = &["debian", "ubuntu"];

/// Read-only snapshot of everything the process needs from the host before
/// any menu is shown.
pub struct Environment {
    pub os: OsIdentity,
    pub fetch_tool: FetchTool,
}

/// Probe OS identity, privilege and fetch capability. Each failure here is
/// fatal: the installer cannot do anything useful without them.
pub fn probe_environment() -> SetupResult<Environment> {
    let os = detect_os()?;

    if !is_root() {
        return Err(SetupError::NotRoot);
    }

    let fetch_tool = detect_fetch_tool().ok_or(SetupError::NoFetchTool)?;

    Ok(Environment { os, fetch_tool })
}

pub fn is_supported_family(family: &str) -> bool {
    SUPPORTED_FAMILIES.contains(&family)
}

/// Detect the OS from /etc/os-release
pub fn detect_os() -> SetupResult<OsIdentity> {
    let content = fs::read_to_string("/etc/os-release")
        .map_err(|e| SetupError::OsUndetectable(format!("/etc/os-release: {}", e)))?;

    parse_os_release(&content).ok_or_else(|| {
        SetupError::OsUndetectable("no ID field in /etc/os-release".to_string())
    })
}

/// Parse os-release file content to extract identity info.
/// Returns None when the ID field is missing or empty.
pub fn parse_os_release(content: &str) -> Option<OsIdentity> {
    let family = extract_os_field(content, "ID")?;
    let version = extract_os_field(content, "VERSION_ID").unwrap_or_default();
    let codename = extract_os_field(content, "VERSION_CODENAME").unwrap_or_default();

    Some(OsIdentity {
        family,
        version,
        codename,
    })
}

/// Extract a field value from os-release format
/// Handles both KEY=value and KEY="value" formats
fn extract_os_field(content: &str, field_name: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.starts_with(&format!("{}=", field_name)))
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

pub fn which_binary(binary: &str) -> Option<String> {
    let output = Command::new("which").arg(binary).output().ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

/// curl is preferred; wget is the fallback.
pub fn detect_fetch_tool() -> Option<FetchTool> {
    if which_binary("curl").is_some() {
        Some(FetchTool::Curl)
    } else if which_binary("wget").is_some() {
        Some(FetchTool::Wget)
    } else {
        None
    }
}
