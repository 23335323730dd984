//! The embedded engine, as seen from this layer.
//!
//! [`Engine`] is the capability set the lifecycle controller consumes. It is
//! a thin, handle-based mirror of the engine's own entry points: every method
//! takes raw handles borrowed from a [`Token`](crate::Token) for the duration
//! of the call, and creation methods return a handle that already carries one
//! reference for the caller.
//!
//! Implementations live outside this crate: the foreign function table in
//! `cef-host-ffi`, or [`RecordingEngine`](crate::testing::RecordingEngine)
//! under the `testing` feature.

use std::sync::Arc;

use cef_host_protocol::{BrowserSettings, ExtraInfo, KeyEvent, MainArgs, MouseClick, Settings, WindowInfo};

use crate::capabilities::Capabilities;
use crate::handle::{RawHandle, RefCount};

/// Engine entry points used by the embedding.
///
/// None of these methods block. Work the engine schedules is carried out by
/// [`Engine::do_message_loop_work`], which the host drives.
pub trait Engine: RefCount {
    /// Runs the sub-process role selected by `args`, to completion.
    ///
    /// Returns the exit code for a sub-process launch and a negative value if
    /// `args` describe the primary process.
    fn execute_process(&self, args: &MainArgs) -> i32;

    /// Allocates an application object bound to `capabilities`.
    ///
    /// The returned handle carries one reference owned by the caller.
    fn create_app(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle>;

    /// Allocates a client object bound to `capabilities`.
    ///
    /// The returned handle carries one reference owned by the caller.
    fn create_client(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle>;

    /// Initializes the engine in the primary process. Returns false on failure.
    fn initialize(&self, args: &MainArgs, settings: &Settings, app: RawHandle) -> bool;

    /// Creates a browser. Returns `None` if the engine refuses.
    ///
    /// The returned handle carries one reference owned by the caller.
    fn create_browser(
        &self,
        window: &WindowInfo,
        client: RawHandle,
        url: &str,
        settings: &BrowserSettings,
        extra_info: &ExtraInfo,
    ) -> Option<RawHandle>;

    /// Engine-assigned identifier of `browser`.
    fn browser_identifier(&self, browser: RawHandle) -> i32;

    /// URL of the main frame, or `None` if the browser has no main frame.
    fn main_frame_url(&self, browser: RawHandle) -> Option<String>;

    /// Navigates the main frame. Returns false if there is no main frame.
    fn load_url(&self, browser: RawHandle, url: &str) -> bool;

    /// Runs `code` in the main frame. Returns false if there is no main frame.
    fn execute_javascript(&self, browser: RawHandle, code: &str, script_url: &str, start_line: i32) -> bool;

    fn send_mouse_click(&self, browser: RawHandle, click: &MouseClick);

    fn send_key_event(&self, browser: RawHandle, event: &KeyEvent);

    fn reload(&self, browser: RawHandle);

    /// Tells the engine the view size changed and a new frame is needed.
    fn was_resized(&self, browser: RawHandle);

    /// Requests the browser to close. `force` skips unload handlers and dialogs.
    /// Completion is reported through the client's before-close callbacks.
    fn close_browser(&self, browser: RawHandle, force: bool);

    /// Performs one slice of pending work and returns.
    fn do_message_loop_work(&self);

    /// Tears down process-wide engine state.
    fn shutdown(&self);
}

/// Widens an engine to its reference-counting half.
pub fn ref_counter(engine: &Arc<dyn Engine>) -> Arc<dyn RefCount> {
    Arc::new(EngineRefs(Arc::clone(engine)))
}

struct EngineRefs(Arc<dyn Engine>);

impl RefCount for EngineRefs {
    fn add_ref(&self, kind: crate::handle::Kind, handle: RawHandle) {
        self.0.add_ref(kind, handle);
    }

    fn release(&self, kind: crate::handle::Kind, handle: RawHandle) -> bool {
        self.0.release(kind, handle)
    }
}
