use crate::core::types::{ExecMode, FetchTool, OsIdentity};

/// Process-wide execution context, built once at startup and passed by
/// reference everywhere. Immutable after construction; there is no ambient
/// global state.
#[derive(Debug, Clone)]
pub struct Session {
    pub os: OsIdentity,
    #[allow(dead_code)]
    pub is_root: bool,
    pub exec_mode: ExecMode,
    pub branch: String,
    pub force_refresh: bool,
    pub fetch_tool: FetchTool,
}
