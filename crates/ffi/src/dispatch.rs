//! Engine-facing entry points: the native shim reports events through these.
//!
//! `capabilities` is the pointer the shim received from `create_app` or
//! `create_client`. It is borrowed for the call only.

use std::ffi::{CString, c_char, c_void};

use cef_host::{Capabilities, Error, LoadEndEvent, PaintEvent, ProcessMessage, ProcessRole, Result};
use serde_json::Value;

use crate::status::{status, str_arg};

/// # Safety
///
/// `ptr` must be null or a live capabilities pointer handed out by this crate.
unsafe fn borrow<'a>(ptr: *const c_void) -> Result<&'a Capabilities> {
	if ptr.is_null() {
		return Err(Error::NullHandle { kind: "capabilities" });
	}
	Ok(unsafe { &*ptr.cast::<Capabilities>() })
}

/// # Safety
///
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_context_initialized(capabilities: *const c_void) -> i32 {
	let result = unsafe { borrow(capabilities) }.map(Capabilities::dispatch_context_initialized);
	status("dispatch context initialized", result)
}

/// Runs the host's command-line hook for a process of `process_type` and
/// reports every switch it added through `append`.
///
/// # Safety
///
/// See the module documentation. `process_type` must be a NUL-terminated
/// string; `append` is called with `append_context` during this call only.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_command_line(
	capabilities: *const c_void,
	process_type: *const c_char,
	append: Option<unsafe extern "C" fn(append_context: *mut c_void, switch: *const c_char)>,
	append_context: *mut c_void,
) -> i32 {
	let result = (|| -> Result<()> {
		let caps = unsafe { borrow(capabilities) }?;
		let role = ProcessRole::from_switch(unsafe { str_arg(process_type, "process type") }?);
		let append = append.ok_or_else(|| Error::InvalidArgument("append callback is null".into()))?;

		let mut switches = Vec::new();
		caps.dispatch_command_line(&role, &mut switches);
		for switch in switches {
			let switch = CString::new(switch).map_err(|_| Error::InvalidArgument("switch contains NUL".into()))?;
			unsafe { append(append_context, switch.as_ptr()) };
		}
		Ok(())
	})();
	status("dispatch command line", result)
}

/// # Safety
///
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_after_created(capabilities: *const c_void, browser_id: i32) -> i32 {
	let result = unsafe { borrow(capabilities) }.map(|caps| caps.dispatch_after_created(browser_id));
	status("dispatch after created", result)
}

/// # Safety
///
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_before_close(capabilities: *const c_void, browser_id: i32) -> i32 {
	let result = unsafe { borrow(capabilities) }.map(|caps| caps.dispatch_before_close(browser_id));
	status("dispatch before close", result)
}

/// # Safety
///
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_load_end(
	capabilities: *const c_void,
	browser_id: i32,
	http_status_code: i32,
) -> i32 {
	let result = unsafe { borrow(capabilities) }.map(|caps| {
		caps.dispatch_load_end(LoadEndEvent {
			browser_id,
			http_status_code,
		})
	});
	status("dispatch load end", result)
}

/// Delivers an off-screen frame. `pixels` holds `width * height * 4` BGRA
/// bytes and is copied.
///
/// # Safety
///
/// See the module documentation. `pixels` must be readable for the full frame.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_paint(
	capabilities: *const c_void,
	browser_id: i32,
	pixels: *const u8,
	width: u32,
	height: u32,
) -> i32 {
	let result = (|| -> Result<()> {
		let caps = unsafe { borrow(capabilities) }?;
		let len = PaintEvent::expected_len(width, height);
		let pixels = match (pixels.is_null(), len) {
			(_, 0) => Vec::new(),
			(true, _) => return Err(Error::InvalidArgument("pixel buffer is null".into())),
			(false, len) => unsafe { std::slice::from_raw_parts(pixels, len) }.to_vec(),
		};
		caps.dispatch_paint(PaintEvent {
			browser_id,
			width,
			height,
			pixels,
		});
		Ok(())
	})();
	status("dispatch paint", result)
}

/// Delivers a render-process message. `arguments_json` is a JSON array, or
/// null for none.
///
/// # Safety
///
/// See the module documentation. String arguments must be NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_dispatch_process_message(
	capabilities: *const c_void,
	browser_id: i32,
	name: *const c_char,
	arguments_json: *const c_char,
) -> i32 {
	let result = (|| -> Result<()> {
		let caps = unsafe { borrow(capabilities) }?;
		let name = unsafe { str_arg(name, "message name") }?.to_string();
		let arguments = if arguments_json.is_null() {
			Vec::new()
		} else {
			let json = unsafe { str_arg(arguments_json, "message arguments") }?;
			match serde_json::from_str::<Value>(json)? {
				Value::Array(items) => items,
				other => {
					return Err(Error::InvalidArgument(format!(
						"message arguments must be a JSON array, got {other}"
					)));
				}
			}
		};
		caps.dispatch_process_message(ProcessMessage {
			browser_id,
			name,
			arguments,
		});
		Ok(())
	})();
	status("dispatch process message", result)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use parking_lot::Mutex;

	use super::*;
	use crate::cef_host_capabilities_release;
	use crate::status::{CEF_HOST_ERR_INVALID_ARGUMENT, CEF_HOST_ERR_OTHER, CEF_HOST_OK};

	fn recording() -> (Arc<Mutex<Vec<String>>>, *const c_void) {
		let log = Arc::new(Mutex::new(Vec::new()));
		let (closed, painted, messages) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
		let caps = Capabilities::builder()
			.on_before_close(move |e| closed.lock().push(format!("close {}", e.browser_id)))
			.on_paint(move |f| painted.lock().push(format!("paint {} {}", f.browser_id, f.pixels.len())))
			.on_process_message(move |m| messages.lock().push(format!("{} {:?}", m.name, m.arguments)))
			.on_command_line(|role, switches| switches.push(format!("--for={role}")))
			.build();
		(log, Arc::into_raw(caps).cast())
	}

	unsafe extern "C" fn collect(context: *mut c_void, switch: *const c_char) {
		let out = unsafe { &mut *context.cast::<Vec<String>>() };
		out.push(unsafe { std::ffi::CStr::from_ptr(switch) }.to_string_lossy().into_owned());
	}

	#[test]
	fn events_reach_host_handlers() {
		let (log, caps) = recording();
		let pixels = [0u8; 16];

		unsafe {
			assert_eq!(cef_host_dispatch_before_close(caps, 2), CEF_HOST_OK);
			assert_eq!(cef_host_dispatch_paint(caps, 2, pixels.as_ptr(), 2, 2), CEF_HOST_OK);
			assert_eq!(
				cef_host_dispatch_process_message(caps, 2, c"ping".as_ptr(), c"[1]".as_ptr()),
				CEF_HOST_OK
			);
			cef_host_capabilities_release(caps);
		}

		assert_eq!(
			*log.lock(),
			vec!["close 2".to_string(), "paint 2 16".to_string(), "ping [Number(1)]".to_string()]
		);
	}

	#[test]
	fn command_line_switches_are_reported_back() {
		let (_log, caps) = recording();
		let mut switches: Vec<String> = Vec::new();

		let code = unsafe {
			cef_host_dispatch_command_line(
				caps,
				c"gpu-process".as_ptr(),
				Some(collect),
				(&mut switches as *mut Vec<String>).cast(),
			)
		};
		unsafe { cef_host_capabilities_release(caps) };

		assert_eq!(code, CEF_HOST_OK);
		assert_eq!(switches, vec!["--for=gpu-process".to_string()]);
	}

	#[test]
	fn malformed_input_is_rejected() {
		let (log, caps) = recording();

		unsafe {
			assert_eq!(cef_host_dispatch_before_close(std::ptr::null(), 1), CEF_HOST_ERR_INVALID_ARGUMENT);
			assert_eq!(
				cef_host_dispatch_paint(caps, 1, std::ptr::null(), 1, 1),
				CEF_HOST_ERR_INVALID_ARGUMENT
			);
			assert_eq!(
				cef_host_dispatch_process_message(caps, 1, c"m".as_ptr(), c"{}".as_ptr()),
				CEF_HOST_ERR_INVALID_ARGUMENT
			);
			assert_eq!(
				cef_host_dispatch_process_message(caps, 1, c"m".as_ptr(), c"[".as_ptr()),
				CEF_HOST_ERR_OTHER
			);
			cef_host_capabilities_release(caps);
		}

		assert!(log.lock().is_empty());
	}
}
