//! Sub-process executable resolution.
//!
//! The engine re-launches a companion executable for its render, GPU and
//! utility processes. This module decides which path is handed to it.

use std::path::{Path, PathBuf};

use cef_host_protocol::SUBPROCESS_EXECUTABLE;
use tracing::{debug, warn};

/// Environment variable overriding the sub-process executable path.
pub const SUBPROCESS_PATH_ENV: &str = "CEF_HOST_SUBPROCESS_PATH";

/// Get the path of the sub-process executable.
///
/// Candidates, in order:
/// 1. `CEF_HOST_SUBPROCESS_PATH` environment variable (runtime override)
/// 2. The platform-named binary (`cef` / `cef.exe`) next to the running executable
/// 3. The bare platform name, resolved by the engine relative to its working directory
///
/// An override that points at a missing file is reported and skipped.
pub fn get_subprocess_executable() -> PathBuf {
    let override_path = std::env::var_os(SUBPROCESS_PATH_ENV).map(PathBuf::from);
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    resolve_subprocess_executable(override_path, exe_dir.as_deref())
}

fn resolve_subprocess_executable(override_path: Option<PathBuf>, exe_dir: Option<&Path>) -> PathBuf {
    // 1. Runtime override
    if let Some(path) = override_path {
        if path.is_file() {
            debug!(target: "cef_host", source = SUBPROCESS_PATH_ENV, path = %path.display(), "sub-process executable");
            return path;
        }
        warn!(
            target: "cef_host",
            source = SUBPROCESS_PATH_ENV,
            path = %path.display(),
            "sub-process executable override does not exist; ignoring"
        );
    }

    // 2. Sibling of the running executable
    if let Some(dir) = exe_dir {
        let sibling = dir.join(SUBPROCESS_EXECUTABLE);
        if sibling.is_file() {
            debug!(target: "cef_host", source = "sibling", path = %sibling.display(), "sub-process executable");
            return sibling;
        }
    }

    // 3. Bare name
    debug!(target: "cef_host", source = "bare name", path = SUBPROCESS_EXECUTABLE, "sub-process executable");
    PathBuf::from(SUBPROCESS_EXECUTABLE)
}
