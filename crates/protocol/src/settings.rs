//! Process-wide engine settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log file the engine writes to, relative to the working directory.
pub const LOG_FILE: &str = "cef-binary.log";

/// Name of the companion executable the engine launches for sub-process roles.
#[cfg(windows)]
pub const SUBPROCESS_EXECUTABLE: &str = "cef.exe";

/// Name of the companion executable the engine launches for sub-process roles.
#[cfg(not(windows))]
pub const SUBPROCESS_EXECUTABLE: &str = "cef";

/// Settings passed to the engine when it is initialized.
///
/// The embedding runs one executable for the primary process and every
/// sub-process role, renders off-screen and is pumped by the host, so
/// [`Settings::embedded`] is the only constructor used by the lifecycle
/// controller. The fields stay public so an engine implementation can read
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Process sandboxing. Must be disabled when the same executable serves
    /// every process role.
    pub no_sandbox: bool,
    /// Render into a buffer instead of a native window.
    pub windowless_rendering_enabled: bool,
    /// The host's event loop drives the engine; native loop messages meant for
    /// the engine are not swallowed by an internal loop.
    pub external_message_pump: bool,
    /// Whether the engine runs its browser-process loop on its own thread.
    pub multi_threaded_message_loop: bool,
    /// Engine log destination.
    pub log_file: PathBuf,
    /// Executable launched for render, GPU and utility processes.
    pub browser_subprocess_path: PathBuf,
}

impl Settings {
    /// Fixed policy for this embedding with the given sub-process executable.
    pub fn embedded(browser_subprocess_path: impl Into<PathBuf>) -> Self {
        Self {
            no_sandbox: true,
            windowless_rendering_enabled: true,
            external_message_pump: true,
            multi_threaded_message_loop: false,
            log_file: PathBuf::from(LOG_FILE),
            browser_subprocess_path: browser_subprocess_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_policy_is_fixed() {
        let settings = Settings::embedded("bin/cef");

        assert!(settings.no_sandbox);
        assert!(settings.windowless_rendering_enabled);
        assert!(settings.external_message_pump);
        assert!(!settings.multi_threaded_message_loop);
        assert_eq!(settings.log_file, PathBuf::from("cef-binary.log"));
        assert_eq!(settings.browser_subprocess_path, PathBuf::from("bin/cef"));
    }

    #[test]
    fn serializes_with_engine_field_names() {
        let json = serde_json::to_value(Settings::embedded("cef")).unwrap();

        assert_eq!(json["noSandbox"], true);
        assert_eq!(json["multiThreadedMessageLoop"], false);
        assert_eq!(json["browserSubprocessPath"], "cef");
    }
}
