//! Engine function table supplied by the native shim.
//!
//! The shim wraps the engine's own C interface and hands this layer a table
//! of plain functions. [`ForeignEngine`] adapts that table to
//! [`Engine`](cef_host::Engine).

use std::ffi::{CStr, CString, c_char, c_void};
use std::sync::Arc;

use cef_host::{
	BrowserSettings, Capabilities, Engine, Error, ExtraInfo, KeyEvent, KeyEventKind, Kind, MainArgs, MouseButton,
	MouseClick, RawHandle, RefCount, Result, Settings, WindowInfo,
};
use tracing::warn;

/// Engine initialization settings, as passed to the shim.
#[repr(C)]
pub struct CefHostSettings {
	pub no_sandbox: bool,
	pub windowless_rendering_enabled: bool,
	pub external_message_pump: bool,
	pub multi_threaded_message_loop: bool,
	pub log_file: *const c_char,
	pub browser_subprocess_path: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CefHostWindowInfo {
	pub windowless: bool,
	pub parent_window: u64,
}

/// One half of a click. `button`: 0 left, 1 middle, 2 right.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CefHostMouseClick {
	pub x: i32,
	pub y: i32,
	pub modifiers: u32,
	pub button: i32,
	pub mouse_up: bool,
	pub click_count: i32,
}

/// `kind`: 0 raw key down, 1 key down, 2 key up, 3 char.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CefHostKeyEvent {
	pub kind: i32,
	pub modifiers: u32,
	pub windows_key_code: i32,
	pub native_key_code: i32,
	pub character: u16,
	pub unmodified_character: u16,
}

impl From<&WindowInfo> for CefHostWindowInfo {
	fn from(window: &WindowInfo) -> Self {
		Self {
			windowless: window.windowless,
			parent_window: window.parent_window,
		}
	}
}

impl From<&MouseClick> for CefHostMouseClick {
	fn from(click: &MouseClick) -> Self {
		Self {
			x: click.event.x,
			y: click.event.y,
			modifiers: click.event.modifiers,
			button: match click.button {
				MouseButton::Left => 0,
				MouseButton::Middle => 1,
				MouseButton::Right => 2,
			},
			mouse_up: click.mouse_up,
			click_count: i32::try_from(click.click_count).unwrap_or(i32::MAX),
		}
	}
}

impl From<&KeyEvent> for CefHostKeyEvent {
	fn from(event: &KeyEvent) -> Self {
		Self {
			kind: match event.kind {
				KeyEventKind::RawKeyDown => 0,
				KeyEventKind::KeyDown => 1,
				KeyEventKind::KeyUp => 2,
				KeyEventKind::Char => 3,
			},
			modifiers: event.modifiers,
			windows_key_code: event.windows_key_code,
			native_key_code: event.native_key_code,
			character: event.character,
			unmodified_character: event.unmodified_character,
		}
	}
}

type Ctx = *mut c_void;
type Obj = *mut c_void;

/// Function table over the native engine.
///
/// Every entry is required. `create_app` and `create_client` receive an
/// owned capabilities pointer: the native object must hand it to
/// [`cef_host_capabilities_release`](crate::cef_host_capabilities_release)
/// when it is destroyed, and pass it to the `cef_host_dispatch_*` functions
/// until then. Creation functions return objects carrying one reference for
/// the caller, or null.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CefHostEngine {
	pub context: Ctx,
	pub add_ref: Option<unsafe extern "C" fn(Ctx, kind: i32, object: Obj)>,
	/// Returns true if the object was destroyed.
	pub release: Option<unsafe extern "C" fn(Ctx, kind: i32, object: Obj) -> bool>,
	pub execute_process: Option<unsafe extern "C" fn(Ctx, argc: i32, argv: *const *const c_char) -> i32>,
	pub create_app: Option<unsafe extern "C" fn(Ctx, capabilities: *const c_void) -> Obj>,
	pub create_client: Option<unsafe extern "C" fn(Ctx, capabilities: *const c_void) -> Obj>,
	pub initialize: Option<
		unsafe extern "C" fn(Ctx, argc: i32, argv: *const *const c_char, settings: *const CefHostSettings, app: Obj) -> bool,
	>,
	/// `extra_info_json` is a JSON object.
	pub create_browser: Option<
		unsafe extern "C" fn(
			Ctx,
			window: *const CefHostWindowInfo,
			client: Obj,
			url: *const c_char,
			windowless_frame_rate: i32,
			extra_info_json: *const c_char,
		) -> Obj,
	>,
	pub browser_identifier: Option<unsafe extern "C" fn(Ctx, browser: Obj) -> i32>,
	/// Main frame URL, valid until the next call on `browser`; null if there is no main frame.
	pub main_frame_url: Option<unsafe extern "C" fn(Ctx, browser: Obj) -> *const c_char>,
	pub load_url: Option<unsafe extern "C" fn(Ctx, browser: Obj, url: *const c_char) -> bool>,
	pub execute_javascript: Option<
		unsafe extern "C" fn(Ctx, browser: Obj, code: *const c_char, script_url: *const c_char, start_line: i32) -> bool,
	>,
	pub send_mouse_click: Option<unsafe extern "C" fn(Ctx, browser: Obj, click: *const CefHostMouseClick)>,
	pub send_key_event: Option<unsafe extern "C" fn(Ctx, browser: Obj, event: *const CefHostKeyEvent)>,
	pub reload: Option<unsafe extern "C" fn(Ctx, browser: Obj)>,
	pub was_resized: Option<unsafe extern "C" fn(Ctx, browser: Obj)>,
	pub close_browser: Option<unsafe extern "C" fn(Ctx, browser: Obj, force: bool)>,
	pub do_message_loop_work: Option<unsafe extern "C" fn(Ctx)>,
	pub shutdown: Option<unsafe extern "C" fn(Ctx)>,
}

/// Validated function table.
#[derive(Clone, Copy)]
struct Table {
	add_ref: unsafe extern "C" fn(Ctx, i32, Obj),
	release: unsafe extern "C" fn(Ctx, i32, Obj) -> bool,
	execute_process: unsafe extern "C" fn(Ctx, i32, *const *const c_char) -> i32,
	create_app: unsafe extern "C" fn(Ctx, *const c_void) -> Obj,
	create_client: unsafe extern "C" fn(Ctx, *const c_void) -> Obj,
	initialize: unsafe extern "C" fn(Ctx, i32, *const *const c_char, *const CefHostSettings, Obj) -> bool,
	create_browser:
		unsafe extern "C" fn(Ctx, *const CefHostWindowInfo, Obj, *const c_char, i32, *const c_char) -> Obj,
	browser_identifier: unsafe extern "C" fn(Ctx, Obj) -> i32,
	main_frame_url: unsafe extern "C" fn(Ctx, Obj) -> *const c_char,
	load_url: unsafe extern "C" fn(Ctx, Obj, *const c_char) -> bool,
	execute_javascript: unsafe extern "C" fn(Ctx, Obj, *const c_char, *const c_char, i32) -> bool,
	send_mouse_click: unsafe extern "C" fn(Ctx, Obj, *const CefHostMouseClick),
	send_key_event: unsafe extern "C" fn(Ctx, Obj, *const CefHostKeyEvent),
	reload: unsafe extern "C" fn(Ctx, Obj),
	was_resized: unsafe extern "C" fn(Ctx, Obj),
	close_browser: unsafe extern "C" fn(Ctx, Obj, bool),
	do_message_loop_work: unsafe extern "C" fn(Ctx),
	shutdown: unsafe extern "C" fn(Ctx),
}

/// [`Engine`] over a native function table.
pub struct ForeignEngine {
	context: Ctx,
	table: Table,
}

// The shim's context and objects are only touched through the table, and the
// engine's reference counts are atomic.
unsafe impl Send for ForeignEngine {}
unsafe impl Sync for ForeignEngine {}

fn required<T>(entry: Option<T>, name: &str) -> Result<T> {
	entry.ok_or_else(|| Error::InvalidArgument(format!("engine table entry '{name}' is null")))
}

impl ForeignEngine {
	/// Validates `engine`.
	///
	/// # Safety
	///
	/// Every function in `engine` must behave as documented on
	/// [`CefHostEngine`] and stay callable, with `context`, for the life of
	/// the process.
	pub unsafe fn new(engine: &CefHostEngine) -> Result<Self> {
		let table = Table {
			add_ref: required(engine.add_ref, "add_ref")?,
			release: required(engine.release, "release")?,
			execute_process: required(engine.execute_process, "execute_process")?,
			create_app: required(engine.create_app, "create_app")?,
			create_client: required(engine.create_client, "create_client")?,
			initialize: required(engine.initialize, "initialize")?,
			create_browser: required(engine.create_browser, "create_browser")?,
			browser_identifier: required(engine.browser_identifier, "browser_identifier")?,
			main_frame_url: required(engine.main_frame_url, "main_frame_url")?,
			load_url: required(engine.load_url, "load_url")?,
			execute_javascript: required(engine.execute_javascript, "execute_javascript")?,
			send_mouse_click: required(engine.send_mouse_click, "send_mouse_click")?,
			send_key_event: required(engine.send_key_event, "send_key_event")?,
			reload: required(engine.reload, "reload")?,
			was_resized: required(engine.was_resized, "was_resized")?,
			close_browser: required(engine.close_browser, "close_browser")?,
			do_message_loop_work: required(engine.do_message_loop_work, "do_message_loop_work")?,
			shutdown: required(engine.shutdown, "shutdown")?,
		};
		Ok(Self {
			context: engine.context,
			table,
		})
	}

	fn create_bound(
		&self,
		create: unsafe extern "C" fn(Ctx, *const c_void) -> Obj,
		capabilities: Arc<Capabilities>,
	) -> Option<RawHandle> {
		let owned = Arc::into_raw(capabilities);
		let handle = RawHandle::new(unsafe { create(self.context, owned.cast()) });
		if handle.is_none() {
			// Not taken by the engine.
			drop(unsafe { Arc::from_raw(owned) });
		}
		handle
	}
}

/// NUL-terminated copies of `args`, kept alive alongside their pointer array.
struct Argv {
	_strings: Vec<CString>,
	pointers: Vec<*const c_char>,
}

impl Argv {
	fn new(args: &MainArgs) -> Self {
		let strings: Vec<CString> = args
			.args()
			.iter()
			.filter_map(|arg| CString::new(arg.as_str()).ok())
			.collect();
		let pointers = strings.iter().map(|s| s.as_ptr()).collect();
		Self {
			_strings: strings,
			pointers,
		}
	}

	fn argc(&self) -> i32 {
		i32::try_from(self.pointers.len()).unwrap_or(i32::MAX)
	}

	fn argv(&self) -> *const *const c_char {
		self.pointers.as_ptr()
	}
}

/// C string for `value`; interior NULs truncate it.
fn c_string(value: &str) -> CString {
	let end = value.find('\0').unwrap_or(value.len());
	if end < value.len() {
		warn!(target: "cef_host", "string argument truncated at interior NUL");
	}
	CString::new(&value[..end]).unwrap_or_default()
}

impl RefCount for ForeignEngine {
	fn add_ref(&self, kind: Kind, handle: RawHandle) {
		unsafe { (self.table.add_ref)(self.context, kind as i32, handle.as_ptr()) }
	}

	fn release(&self, kind: Kind, handle: RawHandle) -> bool {
		unsafe { (self.table.release)(self.context, kind as i32, handle.as_ptr()) }
	}
}

impl Engine for ForeignEngine {
	fn execute_process(&self, args: &MainArgs) -> i32 {
		let argv = Argv::new(args);
		unsafe { (self.table.execute_process)(self.context, argv.argc(), argv.argv()) }
	}

	fn create_app(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle> {
		self.create_bound(self.table.create_app, capabilities)
	}

	fn create_client(&self, capabilities: Arc<Capabilities>) -> Option<RawHandle> {
		self.create_bound(self.table.create_client, capabilities)
	}

	fn initialize(&self, args: &MainArgs, settings: &Settings, app: RawHandle) -> bool {
		let argv = Argv::new(args);
		let log_file = c_string(&settings.log_file.to_string_lossy());
		let subprocess = c_string(&settings.browser_subprocess_path.to_string_lossy());
		let native = CefHostSettings {
			no_sandbox: settings.no_sandbox,
			windowless_rendering_enabled: settings.windowless_rendering_enabled,
			external_message_pump: settings.external_message_pump,
			multi_threaded_message_loop: settings.multi_threaded_message_loop,
			log_file: log_file.as_ptr(),
			browser_subprocess_path: subprocess.as_ptr(),
		};
		unsafe { (self.table.initialize)(self.context, argv.argc(), argv.argv(), &native, app.as_ptr()) }
	}

	fn create_browser(
		&self,
		window: &WindowInfo,
		client: RawHandle,
		url: &str,
		settings: &BrowserSettings,
		extra_info: &ExtraInfo,
	) -> Option<RawHandle> {
		let window = CefHostWindowInfo::from(window);
		let url = c_string(url);
		let extra_info = match serde_json::to_string(extra_info) {
			Ok(json) => c_string(&json),
			Err(err) => {
				warn!(target: "cef_host", error = %err, "extra info not serializable; sending empty");
				c_string("{}")
			}
		};
		let frame_rate = i32::try_from(settings.windowless_frame_rate).unwrap_or(i32::MAX);
		let raw = unsafe {
			(self.table.create_browser)(
				self.context,
				&window,
				client.as_ptr(),
				url.as_ptr(),
				frame_rate,
				extra_info.as_ptr(),
			)
		};
		RawHandle::new(raw)
	}

	fn browser_identifier(&self, browser: RawHandle) -> i32 {
		unsafe { (self.table.browser_identifier)(self.context, browser.as_ptr()) }
	}

	fn main_frame_url(&self, browser: RawHandle) -> Option<String> {
		let url = unsafe { (self.table.main_frame_url)(self.context, browser.as_ptr()) };
		if url.is_null() {
			return None;
		}
		Some(unsafe { CStr::from_ptr(url) }.to_string_lossy().into_owned())
	}

	fn load_url(&self, browser: RawHandle, url: &str) -> bool {
		let url = c_string(url);
		unsafe { (self.table.load_url)(self.context, browser.as_ptr(), url.as_ptr()) }
	}

	fn execute_javascript(&self, browser: RawHandle, code: &str, script_url: &str, start_line: i32) -> bool {
		let code = c_string(code);
		let script_url = c_string(script_url);
		unsafe {
			(self.table.execute_javascript)(
				self.context,
				browser.as_ptr(),
				code.as_ptr(),
				script_url.as_ptr(),
				start_line,
			)
		}
	}

	fn send_mouse_click(&self, browser: RawHandle, click: &MouseClick) {
		let click = CefHostMouseClick::from(click);
		unsafe { (self.table.send_mouse_click)(self.context, browser.as_ptr(), &click) }
	}

	fn send_key_event(&self, browser: RawHandle, event: &KeyEvent) {
		let event = CefHostKeyEvent::from(event);
		unsafe { (self.table.send_key_event)(self.context, browser.as_ptr(), &event) }
	}

	fn reload(&self, browser: RawHandle) {
		unsafe { (self.table.reload)(self.context, browser.as_ptr()) }
	}

	fn was_resized(&self, browser: RawHandle) {
		unsafe { (self.table.was_resized)(self.context, browser.as_ptr()) }
	}

	fn close_browser(&self, browser: RawHandle, force: bool) {
		unsafe { (self.table.close_browser)(self.context, browser.as_ptr(), force) }
	}

	fn do_message_loop_work(&self) {
		unsafe { (self.table.do_message_loop_work)(self.context) }
	}

	fn shutdown(&self) {
		unsafe { (self.table.shutdown)(self.context) }
	}
}
