//! Host callback table supplied by native callers.

use std::ffi::{CString, c_char, c_void};
use std::sync::Arc;

use cef_host::{Capabilities, ProcessRole};
use tracing::warn;

/// Opaque pointer handed back to every host callback.
#[derive(Clone, Copy)]
struct UserData(*mut c_void);

// The pointer is only passed back to the host, which owns its thread-safety.
unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

impl UserData {
	fn ptr(self) -> *mut c_void {
		self.0
	}
}

/// Switch list handed to `on_before_command_line_processing`. Amend it with
/// [`cef_host_command_line_append`](crate::cef_host_command_line_append).
pub type CefHostSwitches = Vec<String>;

/// Callbacks a native host registers for application and client events.
///
/// Every function pointer may be null. Pointers passed to a callback are
/// valid only for the duration of that call.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CefHostCallbacks {
	pub user_data: *mut c_void,
	pub on_context_initialized: Option<unsafe extern "C" fn(user_data: *mut c_void)>,
	pub on_before_command_line_processing: Option<
		unsafe extern "C" fn(user_data: *mut c_void, process_type: *const c_char, switches: *mut CefHostSwitches),
	>,
	pub on_after_created: Option<unsafe extern "C" fn(user_data: *mut c_void, browser_id: i32)>,
	pub on_before_close: Option<unsafe extern "C" fn(user_data: *mut c_void, browser_id: i32)>,
	pub on_load_end: Option<unsafe extern "C" fn(user_data: *mut c_void, browser_id: i32, http_status_code: i32)>,
	/// BGRA pixels, `width * height * 4` bytes.
	pub on_paint:
		Option<unsafe extern "C" fn(user_data: *mut c_void, browser_id: i32, pixels: *const u8, width: u32, height: u32)>,
	/// `arguments_json` is a JSON array.
	pub on_process_message: Option<
		unsafe extern "C" fn(
			user_data: *mut c_void,
			browser_id: i32,
			name: *const c_char,
			arguments_json: *const c_char,
		),
	>,
}

impl Default for CefHostCallbacks {
	fn default() -> Self {
		Self {
			user_data: std::ptr::null_mut(),
			on_context_initialized: None,
			on_before_command_line_processing: None,
			on_after_created: None,
			on_before_close: None,
			on_load_end: None,
			on_paint: None,
			on_process_message: None,
		}
	}
}

impl CefHostCallbacks {
	/// Builds the capability set that forwards to these callbacks.
	///
	/// # Safety
	///
	/// Every non-null function pointer must stay callable, and `user_data`
	/// valid for it, for as long as the returned value is alive.
	pub unsafe fn into_capabilities(self) -> Arc<Capabilities> {
		let data = UserData(self.user_data);
		let mut builder = Capabilities::builder();

		if let Some(f) = self.on_context_initialized {
			builder = builder.on_context_initialized(move || unsafe { f(data.ptr()) });
		}
		if let Some(f) = self.on_before_command_line_processing {
			builder = builder.on_command_line(move |role: &ProcessRole, switches: &mut Vec<String>| {
				let Ok(process_type) = CString::new(role.as_str()) else {
					warn!(target: "cef_host", %role, "process type contains NUL; hook skipped");
					return;
				};
				unsafe { f(data.ptr(), process_type.as_ptr(), switches) };
			});
		}
		if let Some(f) = self.on_after_created {
			builder = builder.on_after_created(move |e| unsafe { f(data.ptr(), e.browser_id) });
		}
		if let Some(f) = self.on_before_close {
			builder = builder.on_before_close(move |e| unsafe { f(data.ptr(), e.browser_id) });
		}
		if let Some(f) = self.on_load_end {
			builder = builder.on_load_end(move |e| unsafe { f(data.ptr(), e.browser_id, e.http_status_code) });
		}
		if let Some(f) = self.on_paint {
			builder = builder.on_paint(move |frame| unsafe {
				f(data.ptr(), frame.browser_id, frame.pixels.as_ptr(), frame.width, frame.height)
			});
		}
		if let Some(f) = self.on_process_message {
			builder = builder.on_process_message(move |message| {
				let name = CString::new(message.name.as_str());
				let arguments = serde_json::to_string(&message.arguments).map(CString::new);
				match (name, arguments) {
					(Ok(name), Ok(Ok(arguments))) => unsafe {
						f(data.ptr(), message.browser_id, name.as_ptr(), arguments.as_ptr())
					},
					_ => warn!(
						target: "cef_host",
						browser_id = message.browser_id,
						name = %message.name,
						"process message not representable as C strings; dropped"
					),
				}
			});
		}

		builder.build()
	}
}
