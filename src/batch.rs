use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::components::{self, Component};
use crate::core::config::{EXIT_FAILURE, EXIT_SUCCESS, LAST_BATCH_FILE};
use crate::core::error::{SetupError, SetupResult};
use crate::core::session::Session;
use crate::core::types::{Mode, Status, Verb};
use crate::detector::{component_status, SystemProbe};
use crate::execution::dispatch;
use crate::resolver::HandlerStore;
use crate::utils::{log_message, LogLevel};

/// Final bucket for one batch component. Every component lands in exactly
/// one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    NewlyInstalled,
    AlreadyPresent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub id: String,
    pub name: String,
    pub disposition: Disposition,
    pub before: Status,
    pub after: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub timestamp: DateTime<Utc>,
    pub os: String,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn count(&self, disposition: Disposition) -> usize {
        self.entries
            .iter()
            .filter(|e| e.disposition == disposition)
            .count()
    }
}

/// The install-everything state machine:
/// SNAPSHOT_BEFORE -> RUN_EACH -> SNAPSHOT_AFTER -> SUMMARIZE.
///
/// Components already installed in the before snapshot are never touched.
/// A failed install is recorded and the run continues; partial success is
/// an accepted terminal outcome. Disposition is judged purely on the
/// before/after snapshots: a component that was supposed to appear and did
/// not is a failure even if its installer claimed success.
pub fn run_batch<F>(
    batch: &[&Component],
    probe: &dyn SystemProbe,
    mut install: F,
) -> Vec<BatchEntry>
where
    F: FnMut(&Component) -> SetupResult<bool>,
{
    let before: Vec<Status> = batch.iter().map(|c| component_status(probe, c)).collect();

    let mut errors: Vec<Option<String>> = Vec::with_capacity(batch.len());
    for (component, before_status) in batch.iter().copied().zip(&before) {
        if before_status.installed {
            log_message(
                LogLevel::Info,
                &format!("{} already installed, skipping", component.id),
            );
            errors.push(None);
            continue;
        }

        match install(component) {
            Ok(true) => errors.push(None),
            Ok(false) => errors.push(Some("handler reported failure".to_string())),
            Err(e) => {
                log_message(LogLevel::Error, &format!("{}: {}", component.id, e));
                errors.push(Some(e.to_string()));
            }
        }
    }

    let after: Vec<Status> = batch.iter().map(|c| component_status(probe, c)).collect();

    batch
        .iter()
        .zip(before)
        .zip(after)
        .zip(errors)
        .map(|(((component, before), after), error)| {
            let disposition = if before.installed {
                Disposition::AlreadyPresent
            } else if after.installed {
                Disposition::NewlyInstalled
            } else {
                Disposition::Failed
            };

            BatchEntry {
                id: component.id.to_string(),
                name: component.name.to_string(),
                disposition,
                before,
                after,
                error,
            }
        })
        .collect()
}

/// Interactive entry point for the batch flow: runs every managed
/// component unattended, prints the summary and persists it.
pub fn install_everything(
    session: &Session,
    store: &HandlerStore,
    probe: &dyn SystemProbe,
) -> i32 {
    println!("\n═══ INSTALLING ALL COMPONENTS ═══\n");
    log_message(
        LogLevel::Info,
        "Snapshotting component state before installation...",
    );

    let batch = components::managed();
    let entries = run_batch(&batch, probe, |component| {
        dispatch(component, Verb::Install, Mode::Unattended, store, session)
            .map(|status| status.success())
    });

    let report = BatchReport {
        timestamp: Utc::now(),
        os: format!("{} {}", session.os.family, session.os.version),
        entries,
    };

    print_summary(&report);

    if let Err(e) = persist_report(&report, Path::new(LAST_BATCH_FILE)) {
        log_message(
            LogLevel::Warning,
            &format!("Could not persist batch summary: {}", e),
        );
    }

    if report.count(Disposition::Failed) == 0 {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

fn format_status(status: &Status) -> String {
    if !status.installed {
        return "not installed".to_string();
    }

    let state = if status.active { "active" } else { "installed" };
    match &status.version {
        Some(version) => format!("{} ({})", state, version),
        None => state.to_string(),
    }
}

fn print_summary(report: &BatchReport) {
    println!("\n═══ BATCH SUMMARY ═══\n");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Component", "Before", "After", "Result"]);
    for entry in &report.entries {
        let result = match entry.disposition {
            Disposition::NewlyInstalled => "newly installed".to_string(),
            Disposition::AlreadyPresent => "already present".to_string(),
            Disposition::Failed => match &entry.error {
                Some(error) => format!("FAILED: {}", error),
                None => "FAILED: did not appear after install".to_string(),
            },
        };
        table.add_row(vec![
            entry.name.clone(),
            format_status(&entry.before),
            format_status(&entry.after),
            result,
        ]);
    }
    println!("{}\n", table);

    let newly = report.count(Disposition::NewlyInstalled);
    let present = report.count(Disposition::AlreadyPresent);
    let failed = report.count(Disposition::Failed);

    if failed == 0 {
        log_message(
            LogLevel::Pass,
            &format!(
                "Batch complete: {} newly installed, {} already present",
                newly, present
            ),
        );
    } else {
        log_message(
            LogLevel::Warning,
            &format!(
                "Batch complete with failures: {} newly installed, {} already present, {} failed",
                newly, present, failed
            ),
        );
    }
}

/// Atomic write of the summary snapshot: temp file, restrictive
/// permissions, rename into place.
fn persist_report(report: &BatchReport, path: &Path) -> SetupResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => {
            return Err(SetupError::ExecutionFailed(format!(
                "Invalid snapshot path: {}",
                path.display()
            )))
        }
    };

    let data = serde_json::to_vec_pretty(report)
        .map_err(|e| SetupError::ExecutionFailed(format!("Snapshot serialization: {}", e)))?;
    fs::write(&temp_path, &data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o640));
    }
    fs::rename(&temp_path, path)?;

    Ok(())
}
