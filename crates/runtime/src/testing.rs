//! In-memory engine double.
//!
//! [`RecordingEngine`] implements [`Engine`] without a browser: it hands out
//! fake handles, keeps a per-object intrusive count, records every call in
//! order and queues the notifications a real engine would deliver on the next
//! pump (after-created, load-end, before-close).
//!
//! Counting mistakes panic immediately: an `add_ref` on a destroyed object or a
//! `release` past zero is exactly the bug the ownership bridge exists to
//! prevent.

use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::sync::Arc;

use cef_host_protocol::{
    BrowserSettings, ExtraInfo, KeyEvent, LoadEndEvent, MainArgs, MouseClick, PaintEvent, ProcessRole, Settings,
    WindowInfo,
};
use parking_lot::Mutex;

use crate::capabilities::Capabilities;
use crate::engine::Engine;
use crate::handle::{Kind, RawHandle, RefCount};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ExecuteProcess { role: ProcessRole },
    CreateApp,
    CreateClient,
    Initialize { settings: Settings },
    CreateBrowser {
        url: String,
        window: WindowInfo,
        settings: BrowserSettings,
        extra_info: ExtraInfo,
    },
    LoadUrl { browser_id: i32, url: String },
    ExecuteJavascript {
        browser_id: i32,
        code: String,
        script_url: String,
        start_line: i32,
    },
    MouseClick { browser_id: i32, click: MouseClick },
    Key { browser_id: i32, event: KeyEvent },
    Reload { browser_id: i32 },
    WasResized { browser_id: i32 },
    CloseBrowser { browser_id: i32, force: bool },
    DoMessageLoopWork,
    Shutdown,
}

impl Call {
    /// Browser the call targeted, if any.
    pub fn browser_id(&self) -> Option<i32> {
        match self {
            Call::LoadUrl { browser_id, .. }
            | Call::ExecuteJavascript { browser_id, .. }
            | Call::MouseClick { browser_id, .. }
            | Call::Key { browser_id, .. }
            | Call::Reload { browser_id }
            | Call::WasResized { browser_id }
            | Call::CloseBrowser { browser_id, .. } => Some(*browser_id),
            _ => None,
        }
    }
}

struct FakeBrowser {
    id: i32,
    client: usize,
    url: String,
    has_frame: bool,
    /// The engine's own reference, dropped once the close is confirmed.
    engine_ref: bool,
}

struct FakeObject {
    kind: Kind,
    refs: i64,
    browser: Option<FakeBrowser>,
}

enum Pending {
    ContextInitialized { app: usize },
    AfterCreated { browser: usize },
    LoadEnd { browser: usize },
    BeforeClose { browser: usize },
    Paint { browser: usize, width: u32, height: u32 },
}

#[derive(Default)]
struct State {
    next_addr: usize,
    next_browser_id: i32,
    objects: HashMap<usize, FakeObject>,
    capabilities: HashMap<usize, Arc<Capabilities>>,
    pending: VecDeque<Pending>,
    calls: Vec<Call>,
    initialized: bool,
    fail_initialize: bool,
    fail_create_browser: bool,
    fixed_browser_id: Option<i32>,
    subprocess_exit_code: i32,
}

impl State {
    fn allocate(&mut self, kind: Kind, browser: Option<FakeBrowser>, refs: i64) -> RawHandle {
        self.next_addr += 0x10;
        let addr = 0x1000 + self.next_addr;
        self.objects.insert(addr, FakeObject { kind, refs, browser });
        RawHandle::new(addr as *mut c_void).expect("fake addresses are non-null")
    }

    fn browser(&self, handle: RawHandle) -> &FakeBrowser {
        self.objects
            .get(&handle.addr())
            .and_then(|o| o.browser.as_ref())
            .filter(|_| self.objects[&handle.addr()].refs > 0)
            .unwrap_or_else(|| panic!("{handle:?} is not a live browser"))
    }

    fn browser_mut(&mut self, handle: RawHandle) -> &mut FakeBrowser {
        let object = self
            .objects
            .get_mut(&handle.addr())
            .unwrap_or_else(|| panic!("{handle:?} is not a live browser"));
        assert!(object.refs > 0, "{handle:?} used after destruction");
        object
            .browser
            .as_mut()
            .unwrap_or_else(|| panic!("{handle:?} is not a browser"))
    }

    fn addr_of_browser(&self, id: i32) -> Option<usize> {
        self.objects
            .iter()
            .find(|(_, o)| o.refs > 0 && o.browser.as_ref().is_some_and(|b| b.id == id))
            .map(|(addr, _)| *addr)
    }

    fn decrement(&mut self, addr: usize) -> bool {
        let object = self
            .objects
            .get_mut(&addr)
            .unwrap_or_else(|| panic!("release of unknown handle {addr:#x}"));
        assert!(object.refs > 0, "release of destroyed {} handle {addr:#x}", object.kind);
        object.refs -= 1;
        object.refs == 0
    }
}

/// Engine double recording calls and reference counts.
pub struct RecordingEngine {
    state: Mutex<State>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_browser_id: 1,
                ..State::default()
            }),
        }
    }

    /// Makes the next `initialize` calls fail.
    pub fn fail_initialize(&self, fail: bool) {
        self.state.lock().fail_initialize = fail;
    }

    /// Makes the next `create_browser` calls fail.
    pub fn fail_create_browser(&self, fail: bool) {
        self.state.lock().fail_create_browser = fail;
    }

    /// Gives every browser created from now on the identifier `id`, as an
    /// engine recycling identifiers of closed browsers would.
    pub fn reuse_browser_id(&self, id: i32) {
        self.state.lock().fixed_browser_id = Some(id);
    }

    /// Exit code returned for sub-process launches.
    pub fn set_subprocess_exit_code(&self, code: i32) {
        self.state.lock().subprocess_exit_code = code;
    }

    /// Detaches the main frame of `browser_id`, as happens mid-teardown.
    pub fn remove_main_frame(&self, browser_id: i32) {
        let mut state = self.state.lock();
        if let Some(addr) = state.addr_of_browser(browser_id) {
            if let Some(browser) = state.objects.get_mut(&addr).and_then(|o| o.browser.as_mut()) {
                browser.has_frame = false;
            }
        }
    }

    /// Queues an off-screen frame for `browser_id`, delivered on the next pump.
    pub fn queue_paint(&self, browser_id: i32, width: u32, height: u32) {
        let mut state = self.state.lock();
        if let Some(browser) = state.addr_of_browser(browser_id) {
            state.pending.push_back(Pending::Paint { browser, width, height });
        }
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Calls that targeted `browser_id`, in order.
    pub fn browser_calls(&self, browser_id: i32) -> Vec<Call> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.browser_id() == Some(browser_id))
            .cloned()
            .collect()
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.lock().calls)
    }

    /// Current intrusive count of `handle` (0 once destroyed).
    pub fn refcount(&self, handle: RawHandle) -> i64 {
        self.state
            .lock()
            .objects
            .get(&handle.addr())
            .map(|o| o.refs)
            .unwrap_or(0)
    }

    /// Number of objects whose count has not reached zero.
    pub fn live_objects(&self) -> usize {
        self.state.lock().objects.values().filter(|o| o.refs > 0).count()
    }

    /// Number of live objects of `kind`.
    pub fn live_objects_of(&self, kind: Kind) -> usize {
        self.state
            .lock()
            .objects
            .values()
            .filter(|o| o.refs > 0 && o.kind == kind)
            .count()
    }

    /// Notifications waiting for the next pump.
    pub fn pending_events(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn record_for(&self, browser: RawHandle, make: impl FnOnce(i32) -> Call) {
        let mut state = self.state.lock();
        let id = state.browser(browser).id;
        state.calls.push(make(id));
    }

    fn deliver(&self, event: Pending) {
        let (caps, action): (Option<Arc<Capabilities>>, Box<dyn FnOnce(&Capabilities)>) = {
            let mut state = self.state.lock();
            match event {
                Pending::ContextInitialized { app } => (
                    state.capabilities.get(&app).cloned(),
                    Box::new(|caps: &Capabilities| caps.dispatch_context_initialized()),
                ),
                Pending::AfterCreated { browser } | Pending::LoadEnd { browser } | Pending::Paint { browser, .. }
                    if state.objects.get(&browser).is_none_or(|o| o.refs == 0) =>
                {
                    (None, Box::new(|_: &Capabilities| {}))
                }
                Pending::AfterCreated { browser } => {
                    let b = state.objects[&browser].browser.as_ref().expect("browser object");
                    let (id, client) = (b.id, b.client);
                    (
                        state.capabilities.get(&client).cloned(),
                        Box::new(move |caps: &Capabilities| caps.dispatch_after_created(id)),
                    )
                }
                Pending::LoadEnd { browser } => {
                    let b = state.objects[&browser].browser.as_ref().expect("browser object");
                    let (id, client) = (b.id, b.client);
                    (
                        state.capabilities.get(&client).cloned(),
                        Box::new(move |caps: &Capabilities| {
                            caps.dispatch_load_end(LoadEndEvent {
                                browser_id: id,
                                http_status_code: 200,
                            })
                        }),
                    )
                }
                Pending::Paint { browser, width, height } => {
                    let b = state.objects[&browser].browser.as_ref().expect("browser object");
                    let (id, client) = (b.id, b.client);
                    (
                        state.capabilities.get(&client).cloned(),
                        Box::new(move |caps: &Capabilities| {
                            caps.dispatch_paint(PaintEvent {
                                browser_id: id,
                                width,
                                height,
                                pixels: vec![0xff; PaintEvent::expected_len(width, height)],
                            })
                        }),
                    )
                }
                Pending::BeforeClose { browser } => {
                    let object = state.objects.get_mut(&browser).expect("closing browser");
                    let b = object.browser.as_mut().expect("browser object");
                    b.has_frame = false;
                    let (id, client) = (b.id, b.client);
                    if std::mem::take(&mut b.engine_ref) {
                        state.decrement(browser);
                    }
                    (
                        state.capabilities.get(&client).cloned(),
                        Box::new(move |caps: &Capabilities| caps.dispatch_before_close(id)),
                    )
                }
            }
        };

        if let Some(caps) = caps {
            action(&caps);
        }
    }
}

impl RefCount for RecordingEngine {
    fn add_ref(&self, kind: Kind, handle: RawHandle) {
        let mut state = self.state.lock();
        let object = state
            .objects
            .get_mut(&handle.addr())
            .unwrap_or_else(|| panic!("add_ref of unknown handle {handle:?}"));
        assert_eq!(object.kind, kind, "add_ref with wrong kind for {handle:?}");
        assert!(object.refs > 0, "add_ref of destroyed {kind} handle {handle:?}");
        object.refs += 1;
    }

    fn release(&self, kind: Kind, handle: RawHandle) -> bool {
        let mut state = self.state.lock();
        let actual = state.objects.get(&handle.addr()).map(|o| o.kind);
        assert_eq!(actual, Some(kind), "release with wrong kind for {handle:?}");
        state.decrement(handle.addr())
    }
}

impl Engine for RecordingEngine {
    fn execute_process(&self, args: &MainArgs) -> i32 {
        let role = args.role();
        let mut state = self.state.lock();
        state.calls.push(Call::ExecuteProcess { role: role.clone() });
        if role.is_subprocess() { state.subprocess_exit_code.max(0) } else { -1 }
    }

    fn create_app(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateApp);
        let handle = state.allocate(Kind::App, None, 1);
        state.capabilities.insert(handle.addr(), capabilities);
        Some(handle)
    }

    fn create_client(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateClient);
        let handle = state.allocate(Kind::Client, None, 1);
        state.capabilities.insert(handle.addr(), capabilities);
        Some(handle)
    }

    fn initialize(&self, _args: &MainArgs, settings: &Settings, app: RawHandle) -> bool {
        let mut state = self.state.lock();
        state.calls.push(Call::Initialize {
            settings: settings.clone(),
        });
        if state.fail_initialize || state.initialized {
            return false;
        }
        assert!(
            state.objects.get(&app.addr()).is_some_and(|o| o.kind == Kind::App && o.refs > 0),
            "initialize with a dead application handle"
        );
        state.initialized = true;
        state.pending.push_back(Pending::ContextInitialized { app: app.addr() });
        true
    }

    fn create_browser(
        &self,
        window: &WindowInfo,
        client: RawHandle,
        url: &str,
        settings: &BrowserSettings,
        extra_info: &ExtraInfo,
    ) -> Option<RawHandle> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateBrowser {
            url: url.to_string(),
            window: *window,
            settings: *settings,
            extra_info: extra_info.clone(),
        });
        if state.fail_create_browser || !state.initialized {
            return None;
        }
        let id = match state.fixed_browser_id {
            Some(id) => id,
            None => {
                state.next_browser_id += 1;
                state.next_browser_id - 1
            }
        };
        let browser = FakeBrowser {
            id,
            client: client.addr(),
            url: url.to_string(),
            has_frame: true,
            engine_ref: true,
        };
        // One reference for the caller, one kept by the engine until close.
        let handle = state.allocate(Kind::Browser, Some(browser), 2);
        state.pending.push_back(Pending::AfterCreated { browser: handle.addr() });
        Some(handle)
    }

    fn browser_identifier(&self, browser: RawHandle) -> i32 {
        self.state.lock().browser(browser).id
    }

    fn main_frame_url(&self, browser: RawHandle) -> Option<String> {
        let state = self.state.lock();
        let b = state.browser(browser);
        b.has_frame.then(|| b.url.clone())
    }

    fn load_url(&self, browser: RawHandle, url: &str) -> bool {
        let mut state = self.state.lock();
        let b = state.browser_mut(browser);
        let id = b.id;
        let has_frame = b.has_frame;
        if has_frame {
            b.url = url.to_string();
        }
        state.calls.push(Call::LoadUrl {
            browser_id: id,
            url: url.to_string(),
        });
        if has_frame {
            state.pending.push_back(Pending::LoadEnd { browser: browser.addr() });
        }
        has_frame
    }

    fn execute_javascript(&self, browser: RawHandle, code: &str, script_url: &str, start_line: i32) -> bool {
        let mut state = self.state.lock();
        let b = state.browser(browser);
        let (id, has_frame) = (b.id, b.has_frame);
        state.calls.push(Call::ExecuteJavascript {
            browser_id: id,
            code: code.to_string(),
            script_url: script_url.to_string(),
            start_line,
        });
        has_frame
    }

    fn send_mouse_click(&self, browser: RawHandle, click: &MouseClick) {
        let click = *click;
        self.record_for(browser, |browser_id| Call::MouseClick { browser_id, click });
    }

    fn send_key_event(&self, browser: RawHandle, event: &KeyEvent) {
        let event = *event;
        self.record_for(browser, |browser_id| Call::Key { browser_id, event });
    }

    fn reload(&self, browser: RawHandle) {
        self.record_for(browser, |browser_id| Call::Reload { browser_id });
    }

    fn was_resized(&self, browser: RawHandle) {
        self.record_for(browser, |browser_id| Call::WasResized { browser_id });
    }

    fn close_browser(&self, browser: RawHandle, force: bool) {
        self.record_for(browser, |browser_id| Call::CloseBrowser { browser_id, force });
        self.state
            .lock()
            .pending
            .push_back(Pending::BeforeClose { browser: browser.addr() });
    }

    fn do_message_loop_work(&self) {
        let pending: Vec<Pending> = {
            let mut state = self.state.lock();
            state.calls.push(Call::DoMessageLoopWork);
            state.pending.drain(..).collect()
        };
        for event in pending {
            self.deliver(event);
        }
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();
        state.calls.push(Call::Shutdown);
        state.initialized = false;
    }
}
