use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::components::Component;
use crate::core::config::{AUTO_CONFIRM_ENV, DEFAULT_LIB_DIR, DEFAULT_LOG_DIR, VERSION};
use crate::core::error::{SetupError, SetupResult};
use crate::core::session::Session;
use crate::core::types::{Mode, Verb};
use crate::resolver::HandlerStore;
use crate::utils::{log_message, LogLevel};

/// Submit one action: validate the verb, resolve the handler, invoke it.
///
/// Resolution always happens before invocation; a component whose handler
/// cannot be materialized never runs. Failures here are local to the
/// action - callers report them and keep going.
pub fn dispatch(
    component: &Component,
    verb: Verb,
    mode: Mode,
    store: &HandlerStore,
    session: &Session,
) -> SetupResult<ExitStatus> {
    if !component.supports(verb) {
        return Err(SetupError::UnsupportedVerb {
            component: component.id.to_string(),
            verb: verb.as_str(),
        });
    }

    let handler = store
        .resolve(component)
        .map_err(|e| SetupError::UnresolvedHandler {
            component: component.id.to_string(),
            reason: e.to_string(),
        })?;

    run_handler(&handler, component, verb, mode, session)
}

/// Executes a handler script with the standard handler environment.
/// Returns the exit status for proper error propagation.
pub fn run_handler(
    path: &Path,
    component: &Component,
    verb: Verb,
    mode: Mode,
    session: &Session,
) -> SetupResult<ExitStatus> {
    if !path.exists() {
        return Err(SetupError::ExecutionFailed(format!(
            "Handler does not exist: {}",
            path.display()
        )));
    }

    // Handlers are always invoked by absolute path
    let absolute_path = path.canonicalize().map_err(|e| {
        SetupError::ExecutionFailed(format!(
            "Failed to resolve path {}: {}",
            path.display(),
            e
        ))
    })?;

    log_message(
        LogLevel::Info,
        &format!(
            "Running {} {}: {}",
            component.id,
            verb,
            absolute_path.display()
        ),
    );

    let mut command = Command::new("bash");
    command
        .arg(&absolute_path)
        .arg(verb.as_str())
        .env("VPSKIT_OS", &session.os.family)
        .env("VPSKIT_OS_VERSION", &session.os.version)
        .env("VPSKIT_OS_CODENAME", &session.os.codename)
        .env("VPSKIT_LOG_DIR", DEFAULT_LOG_DIR)
        .env("VPSKIT_LIB_DIR", DEFAULT_LIB_DIR)
        .env("VPSKIT_VERSION", VERSION)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    // The auto-confirm signal is scoped to the child; the parent
    // environment is never touched.
    if mode == Mode::Unattended {
        command.env(AUTO_CONFIRM_ENV, "1");
    }

    let status = command.status().map_err(|e| {
        SetupError::ExecutionFailed(format!("Failed to execute {}: {}", component.id, e))
    })?;

    if status.success() {
        log_message(
            LogLevel::Pass,
            &format!("{} {} completed successfully", component.id, verb),
        );
    } else {
        log_message(
            LogLevel::Warning,
            &format!("{} {} exited with status: {}", component.id, verb, status),
        );
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::core::types::{ExecMode, FetchTool, OsIdentity};
    use crate::resolver::Fetcher;
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    // Writes its verb and the auto-confirm variable next to itself so the
    // test can observe exactly what the handler saw.
    const RECORDING_HANDLER: &str = "#!/bin/sh\n\
        printf '%s %s' \"$1\" \"${VPSKIT_ASSUME_YES:-unset}\" > \"$(dirname \"$0\")/invoked\"\n\
        exit 0\n";

    struct FakeFetcher {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> SetupResult<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            Ok(RECORDING_HANDLER.as_bytes().to_vec())
        }
    }

    fn test_session() -> Session {
        Session {
            os: OsIdentity {
                family: "debian".to_string(),
                version: "12".to_string(),
                codename: "bookworm".to_string(),
            },
            is_root: false,
            exec_mode: ExecMode::Remote,
            branch: "stable".to_string(),
            force_refresh: false,
            fetch_tool: FetchTool::Curl,
        }
    }

    fn remote_store(cache_dir: PathBuf, calls: Rc<RefCell<Vec<String>>>) -> HandlerStore {
        HandlerStore::new(
            vec![PathBuf::from("/nonexistent/handlers")],
            cache_dir,
            ExecMode::Remote,
            "stable",
            false,
            Box::new(FakeFetcher { calls }),
        )
    }

    #[test]
    fn unattended_install_fetches_once_and_invokes_with_verb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(dir.path().to_path_buf(), calls.clone());
        let session = test_session();
        let firewall = components::find("firewall").expect("registry entry");

        let status = dispatch(firewall, Verb::Install, Mode::Unattended, &store, &session)
            .expect("dispatch succeeds");

        assert!(status.success());
        assert_eq!(calls.borrow().len(), 1);
        let invoked = fs::read_to_string(dir.path().join("invoked")).expect("marker");
        assert_eq!(invoked, "install 1");
    }

    #[test]
    fn interactive_mode_leaves_auto_confirm_unset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(dir.path().to_path_buf(), calls);
        let session = test_session();
        let firewall = components::find("firewall").expect("registry entry");

        dispatch(firewall, Verb::Status, Mode::Interactive, &store, &session)
            .expect("dispatch succeeds");

        let invoked = fs::read_to_string(dir.path().join("invoked")).expect("marker");
        assert_eq!(invoked, "status unset");
    }

    #[test]
    fn unsupported_verb_is_rejected_before_resolution() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(dir.path().to_path_buf(), calls.clone());
        let session = test_session();
        let delegate = components::find("traffic-report").expect("registry entry");

        let err = dispatch(delegate, Verb::Install, Mode::Interactive, &store, &session)
            .expect_err("delegate cannot install");

        assert!(matches!(err, SetupError::UnsupportedVerb { .. }));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn resolution_failure_becomes_unresolved_handler() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HandlerStore::new(
            vec![PathBuf::from("/nonexistent/handlers")],
            dir.path().to_path_buf(),
            ExecMode::Local,
            "stable",
            false,
            Box::new(FakeFetcher {
                calls: Rc::new(RefCell::new(Vec::new())),
            }),
        );
        let session = test_session();
        let firewall = components::find("firewall").expect("registry entry");

        let err = dispatch(firewall, Verb::Install, Mode::Unattended, &store, &session)
            .expect_err("no handler available");
        assert!(matches!(err, SetupError::UnresolvedHandler { .. }));
    }

    #[test]
    fn failing_handler_reports_its_exit_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handler = dir.path().join("firewall.sh");
        fs::write(&handler, "#!/bin/sh\nexit 3\n").expect("write handler");
        let session = test_session();
        let firewall = components::find("firewall").expect("registry entry");

        let status = run_handler(&handler, firewall, Verb::Install, Mode::Unattended, &session)
            .expect("handler runs");
        assert!(!status.success());
        assert_eq!(status.code(), Some(3));
    }
}
