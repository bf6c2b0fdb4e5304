use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns paths from environment variable or defaults if not set
/// Supports colon-separated paths like Unix PATH variable
pub fn env_or_defaults(var: &str, defaults: &[&str]) -> Vec<PathBuf> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => parse_path_list(&value),
        _ => defaults.iter().map(|&s| PathBuf::from(s)).collect(),
    }
}

/// Parse a colon-separated list of paths into a vector of PathBufs
/// Filters out empty paths and trims whitespace
pub fn parse_path_list(path_str: &str) -> Vec<PathBuf> {
    path_str
        .split(':')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Handler file names are derived deterministically from the component id,
/// one file per component.
pub fn handler_file_name(component_id: &str) -> String {
    format!("{}.sh", component_id)
}

/// Searches for a component's handler in the given directories.
/// Returns the first readable regular file found.
pub fn find_handler(dirs: &[PathBuf], component_id: &str) -> Option<PathBuf> {
    let file_name = handler_file_name(component_id);
    dirs.iter()
        .filter(|dir| dir.is_dir())
        .map(|dir| dir.join(&file_name))
        .find(|path| is_readable_file(path))
}

/// True when any of the given directories contains at least one handler
/// script. Used at startup to decide between local and remote execution.
pub fn any_handler_present(dirs: &[PathBuf]) -> bool {
    for dir in dirs {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sh")
                && is_readable_file(&path)
            {
                return true;
            }
        }
    }
    false
}

fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return false;
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = metadata.permissions().mode();
                (mode & 0o444) != 0
            }
            #[cfg(not(unix))]
            {
                true
            }
        }
        Err(_) => false,
    }
}

pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        true
    }
}

pub fn join_paths(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}
