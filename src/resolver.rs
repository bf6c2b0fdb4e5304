use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::components::Component;
use crate::core::config::{
    CACHE_DIR_ENV, DEFAULT_CACHE_DIR, DEFAULT_HANDLER_DIRS, HANDLER_PATH_ENV, REMOTE_BASE,
};
use crate::core::error::{SetupError, SetupResult};
use crate::core::session::Session;
use crate::core::types::{ExecMode, FetchTool};
use crate::utils::paths::{
    any_handler_present, find_handler, handler_file_name, is_executable, join_paths,
};
use crate::utils::{env_or_defaults, log_message, LogLevel};

/// Seam between resolution and the network. The live implementation shells
/// out to the probed fetch utility; tests inject a fake.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> SetupResult<Vec<u8>>;
}

/// Fetcher backed by curl or wget. Certificate validation stays on and the
/// transport is pinned to HTTPS with a TLS 1.2 floor; there is no downgrade
/// path.
pub struct ToolFetcher {
    tool: FetchTool,
}

impl ToolFetcher {
    pub fn new(tool: FetchTool) -> Self {
        ToolFetcher { tool }
    }
}

impl Fetcher for ToolFetcher {
    fn fetch(&self, url: &str) -> SetupResult<Vec<u8>> {
        let output = match self.tool {
            FetchTool::Curl => Command::new("curl")
                .args(["--proto", "=https", "--tlsv1.2", "-fsSL", url])
                .output(),
            FetchTool::Wget => Command::new("wget")
                .args(["--https-only", "--secure-protocol=TLSv1_2", "-qO-", url])
                .output(),
        };

        let output = output.map_err(|e| SetupError::FetchFailed {
            url: url.to_string(),
            reason: format!("failed to run {}: {}", self.tool.binary(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.tool.binary(), output.status)
            } else {
                stderr
            };
            return Err(SetupError::FetchFailed {
                url: url.to_string(),
                reason,
            });
        }

        Ok(output.stdout)
    }
}

/// Decide between local and remote execution at startup: a populated local
/// handler directory means this is an installed copy that ships every
/// handler; an empty one means we are running as a remote one-liner.
pub fn detect_exec_mode(local_dirs: &[PathBuf]) -> ExecMode {
    if any_handler_present(local_dirs) {
        ExecMode::Local
    } else {
        ExecMode::Remote
    }
}

/// Owns handler materialization. One file per component id; handlers are
/// fetched lazily, at most once per process unless the refresh flag forces
/// a single re-fetch.
pub struct HandlerStore {
    local_dirs: Vec<PathBuf>,
    cache_dir: PathBuf,
    exec_mode: ExecMode,
    branch: String,
    force_refresh: bool,
    fetcher: Box<dyn Fetcher>,
    refreshed: RefCell<HashSet<String>>,
}

impl HandlerStore {
    pub fn new(
        local_dirs: Vec<PathBuf>,
        cache_dir: PathBuf,
        exec_mode: ExecMode,
        branch: &str,
        force_refresh: bool,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        HandlerStore {
            local_dirs,
            cache_dir,
            exec_mode,
            branch: branch.to_string(),
            force_refresh,
            fetcher,
            refreshed: RefCell::new(HashSet::new()),
        }
    }

    pub fn from_session(session: &Session) -> Self {
        let local_dirs = env_or_defaults(HANDLER_PATH_ENV, DEFAULT_HANDLER_DIRS);
        let cache_dir = std::env::var(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR));

        HandlerStore::new(
            local_dirs,
            cache_dir,
            session.exec_mode,
            &session.branch,
            session.force_refresh,
            Box::new(ToolFetcher::new(session.fetch_tool)),
        )
    }

    /// Resolve a component to an executable handler path.
    ///
    /// Shipped handlers win unconditionally; the cache is consulted next;
    /// only remote mode may fetch. A forced refresh re-fetches each
    /// component once per process, after which resolution short-circuits
    /// back to the cache.
    pub fn resolve(&self, component: &Component) -> SetupResult<PathBuf> {
        if let Some(path) = find_handler(&self.local_dirs, component.id) {
            return Ok(path);
        }

        let file_name = handler_file_name(component.id);
        let cached = self.cache_dir.join(&file_name);
        let needs_refresh =
            self.force_refresh && !self.refreshed.borrow().contains(component.id);

        // A cache entry that lost its executable bit is treated as absent
        // and re-fetched rather than handed to the dispatcher.
        if is_executable(&cached) && !needs_refresh {
            return Ok(cached);
        }

        if self.exec_mode == ExecMode::Local {
            let mut searched = self.local_dirs.clone();
            searched.push(self.cache_dir.clone());
            return Err(SetupError::HandlerNotFound {
                component: component.id.to_string(),
                searched: join_paths(&searched),
            });
        }

        let url = format!("{}/{}/{}", REMOTE_BASE, self.branch, file_name);
        log_message(
            LogLevel::Info,
            &format!("Fetching handler for {}: {}", component.id, url),
        );
        let bytes = self.fetcher.fetch(&url)?;

        fs::create_dir_all(&self.cache_dir)?;
        let tmp = self.cache_dir.join(format!("{}.tmp", file_name));
        fs::write(&tmp, &bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755))?;
        }
        fs::rename(&tmp, &cached)?;

        self.refreshed
            .borrow_mut()
            .insert(component.id.to_string());

        Ok(cached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use std::rc::Rc;

    struct FakeFetcher {
        body: &'static str,
        fail: bool,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl FakeFetcher {
        fn ok(body: &'static str, calls: Rc<RefCell<Vec<String>>>) -> Self {
            FakeFetcher {
                body,
                fail: false,
                calls,
            }
        }

        fn failing(calls: Rc<RefCell<Vec<String>>>) -> Self {
            FakeFetcher {
                body: "",
                fail: true,
                calls,
            }
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> SetupResult<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            if self.fail {
                Err(SetupError::FetchFailed {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                })
            } else {
                Ok(self.body.as_bytes().to_vec())
            }
        }
    }

    fn firewall() -> &'static Component {
        components::find("firewall").expect("registry entry")
    }

    fn remote_store(
        cache_dir: PathBuf,
        force_refresh: bool,
        fetcher: FakeFetcher,
    ) -> HandlerStore {
        HandlerStore::new(
            vec![PathBuf::from("/nonexistent/handlers")],
            cache_dir,
            ExecMode::Remote,
            "stable",
            force_refresh,
            Box::new(fetcher),
        )
    }

    #[test]
    fn second_resolve_hits_the_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(
            dir.path().to_path_buf(),
            false,
            FakeFetcher::ok("#!/bin/sh\n", calls.clone()),
        );

        let first = store.resolve(firewall()).expect("first resolve");
        let second = store.resolve(firewall()).expect("second resolve");

        assert_eq!(first, second);
        assert_eq!(calls.borrow().len(), 1);
        assert!(first.is_file());
    }

    #[test]
    fn fetched_handler_is_executable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(
            dir.path().to_path_buf(),
            false,
            FakeFetcher::ok("#!/bin/sh\n", calls),
        );

        let path = store.resolve(firewall()).expect("resolve");
        assert!(crate::utils::paths::is_executable(&path));
    }

    #[test]
    fn force_refresh_fetches_despite_cache_but_only_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("firewall.sh"), "#!/bin/sh\n# stale\n").expect("seed cache");

        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(
            dir.path().to_path_buf(),
            true,
            FakeFetcher::ok("#!/bin/sh\n# fresh\n", calls.clone()),
        );

        store.resolve(firewall()).expect("refresh resolve");
        assert_eq!(calls.borrow().len(), 1);

        // A repeat resolve in the same process short-circuits to the cache.
        store.resolve(firewall()).expect("repeat resolve");
        assert_eq!(calls.borrow().len(), 1);

        let content = fs::read_to_string(dir.path().join("firewall.sh")).expect("read");
        assert!(content.contains("fresh"));
    }

    #[test]
    fn local_mode_never_fetches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = HandlerStore::new(
            vec![PathBuf::from("/nonexistent/handlers")],
            dir.path().to_path_buf(),
            ExecMode::Local,
            "stable",
            false,
            Box::new(FakeFetcher::ok("#!/bin/sh\n", calls.clone())),
        );

        let err = store.resolve(firewall()).expect_err("local miss");
        assert!(matches!(err, SetupError::HandlerNotFound { .. }));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn shipped_handler_wins_over_fetching() {
        let shipped = tempfile::tempdir().expect("tempdir");
        let shipped_path = shipped.path().join("firewall.sh");
        fs::write(&shipped_path, "#!/bin/sh\nexit 0\n").expect("write shipped");

        let cache = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = HandlerStore::new(
            vec![shipped.path().to_path_buf()],
            cache.path().to_path_buf(),
            ExecMode::Remote,
            "stable",
            false,
            Box::new(FakeFetcher::ok("#!/bin/sh\n", calls.clone())),
        );

        let path = store.resolve(firewall()).expect("resolve");
        assert_eq!(path, shipped_path);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn fetch_failure_surfaces_url_and_leaves_no_handler() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = remote_store(
            dir.path().to_path_buf(),
            false,
            FakeFetcher::failing(calls),
        );

        let err = store.resolve(firewall()).expect_err("fetch fails");
        let message = err.to_string();
        assert!(message.contains("/stable/firewall.sh"), "{}", message);
        assert!(!dir.path().join("firewall.sh").exists());
    }

    #[test]
    fn requested_branch_lands_in_the_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store = HandlerStore::new(
            vec![],
            dir.path().to_path_buf(),
            ExecMode::Remote,
            "testing",
            false,
            Box::new(FakeFetcher::ok("#!/bin/sh\n", calls.clone())),
        );

        store.resolve(firewall()).expect("resolve");
        assert_eq!(calls.borrow().len(), 1);
        assert!(
            calls.borrow()[0].ends_with("/testing/firewall.sh"),
            "{}",
            calls.borrow()[0]
        );
    }

    #[test]
    fn exec_mode_follows_local_handler_presence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dirs = vec![dir.path().to_path_buf()];
        assert_eq!(detect_exec_mode(&dirs), ExecMode::Remote);

        fs::write(dir.path().join("firewall.sh"), "#!/bin/sh\n").expect("write");
        assert_eq!(detect_exec_mode(&dirs), ExecMode::Local);
    }
}
