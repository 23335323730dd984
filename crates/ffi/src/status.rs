//! Status codes returned across the C boundary.

use std::ffi::{CStr, c_char};

use cef_host::{Error, Result};
use tracing::{error, warn};

pub const CEF_HOST_OK: i32 = 0;
pub const CEF_HOST_ERR_INITIALIZATION: i32 = -1;
pub const CEF_HOST_ERR_BROWSER_CREATION: i32 = -2;
pub const CEF_HOST_ERR_NO_FRAME: i32 = -3;
pub const CEF_HOST_ERR_INVALID_STATE: i32 = -4;
pub const CEF_HOST_ERR_INVALID_ARGUMENT: i32 = -5;
pub const CEF_HOST_ERR_OTHER: i32 = -6;

/// Maps `result` to a status code.
///
/// Reference-count misuse aborts the process: the ownership state can no
/// longer be trusted.
pub(crate) fn status(operation: &str, result: Result<()>) -> i32 {
	match result {
		Ok(()) => CEF_HOST_OK,
		Err(err) => failure(operation, err),
	}
}

/// Logs `err` and returns its status code.
pub(crate) fn failure(operation: &str, err: Error) -> i32 {
	if let Error::RefcountMisuse(_) = err {
		abort_on_misuse(operation, &err);
	}
	warn!(target: "cef_host", operation, code = err.status_code(), "{err}");
	err.status_code()
}

pub(crate) fn abort_on_misuse(operation: &str, err: &Error) -> ! {
	error!(target: "cef_host", operation, "{err}; aborting");
	std::process::abort()
}

/// Borrows a NUL-terminated UTF-8 argument.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
	if ptr.is_null() {
		return Err(Error::InvalidArgument(format!("{name} is null")));
	}
	unsafe { CStr::from_ptr(ptr) }
		.to_str()
		.map_err(|_| Error::InvalidArgument(format!("{name} is not valid UTF-8")))
}
