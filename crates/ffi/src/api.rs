//! Host-facing C entry points.
//!
//! One engine is attached per process. Objects are addressed by ledger
//! tokens (`0` means failure); every other entry point returns a status code
//! from [`crate::status`].

use std::ffi::{c_char, c_void};
use std::sync::{Arc, OnceLock};

use cef_host::{Capabilities, Engine, EngineProcess, Error, Kind, Result};
use tracing::{info, warn};

use crate::callbacks::{CefHostCallbacks, CefHostSwitches};
use crate::engine::{CefHostEngine, ForeignEngine};
use crate::ledger::{Held, TokenTable};
use crate::logging::init_logging;
use crate::status::{CEF_HOST_ERR_INVALID_STATE, CEF_HOST_OK, abort_on_misuse, failure, status, str_arg};

struct Host {
	process: EngineProcess,
	tokens: TokenTable,
}

static HOST: OnceLock<Host> = OnceLock::new();

fn host() -> Result<&'static Host> {
	HOST.get().ok_or(Error::EngineMissing)
}

/// Runs `op` against the attached host and maps the outcome to a status.
fn with_host(operation: &str, op: impl FnOnce(&'static Host) -> Result<()>) -> i32 {
	status(operation, host().and_then(op))
}

/// Runs `op` and maps the outcome to a token, `0` on failure.
fn issue(operation: &str, op: impl FnOnce(&'static Host) -> Result<Held>) -> u64 {
	match host().and_then(|host| op(host).map(|held| host.tokens.insert(held))) {
		Ok(token) => token,
		Err(err) => {
			failure(operation, err);
			0
		}
	}
}

/// Copies the callback table, treating null as "no callbacks".
///
/// # Safety
///
/// `callbacks` must be null or point to a valid table whose functions stay
/// callable for the life of the objects created from it.
unsafe fn capabilities_from(callbacks: *const CefHostCallbacks) -> Arc<Capabilities> {
	let table = if callbacks.is_null() {
		CefHostCallbacks::default()
	} else {
		unsafe { *callbacks }
	};
	unsafe { table.into_capabilities() }
}

fn kind_arg(operation: &str, kind: i32) -> Kind {
	Kind::from_raw(kind).unwrap_or_else(|| {
		abort_on_misuse(operation, &Error::RefcountMisuse(format!("unknown handle kind {kind}")))
	})
}

/// Installs the log subscriber. `RUST_LOG` overrides `verbosity`.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_init_logging(verbosity: u8) {
	init_logging(verbosity);
}

/// Attaches the native engine. Must be called once, before anything else.
///
/// # Safety
///
/// `engine` must point to a table satisfying the contract documented on
/// [`CefHostEngine`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_attach_engine(engine: *const CefHostEngine) -> i32 {
	if engine.is_null() {
		return failure("attach engine", Error::InvalidArgument("engine table is null".into()));
	}
	let foreign = match unsafe { ForeignEngine::new(&*engine) } {
		Ok(foreign) => foreign,
		Err(err) => return failure("attach engine", err),
	};
	if HOST.get().is_some() {
		warn!(target: "cef_host", "engine already attached");
		return CEF_HOST_ERR_INVALID_STATE;
	}

	let engine: Arc<dyn Engine> = Arc::new(foreign);
	let attached = HOST.set(Host {
		process: EngineProcess::new(engine),
		tokens: TokenTable::new(),
	});
	if attached.is_err() {
		return CEF_HOST_ERR_INVALID_STATE;
	}
	info!(target: "cef_host", "engine attached");
	CEF_HOST_OK
}

/// Dispatches a sub-process launch. A non-negative result is the exit code
/// the process must terminate with; a negative one means this is the primary
/// process.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_run_subprocess_entry() -> i32 {
	match host() {
		Ok(host) => host.process.run_subprocess_entry(),
		Err(err) => failure("run sub-process entry", err),
	}
}

/// # Safety
///
/// `callbacks` must be null or valid; see [`CefHostCallbacks`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_create_application(callbacks: *const CefHostCallbacks) -> u64 {
	let capabilities = unsafe { capabilities_from(callbacks) };
	issue("create application", |host| {
		host.process.create_application(capabilities).map(Held::from)
	})
}

/// # Safety
///
/// `callbacks` must be null or valid; see [`CefHostCallbacks`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_create_client(callbacks: *const CefHostCallbacks) -> u64 {
	let capabilities = unsafe { capabilities_from(callbacks) };
	issue("create client", |host| host.process.create_client(capabilities).map(Held::from))
}

/// Takes another reference on the object behind `token` and returns a new
/// token for it. Aborts if `token` is not a live token of `kind`.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_add_ref(kind: i32, token: u64) -> u64 {
	let kind = kind_arg("add reference", kind);
	match host().and_then(|host| host.tokens.add_ref(kind, token)) {
		Ok(token) => token,
		Err(err) => {
			failure("add reference", err);
			0
		}
	}
}

/// Returns the reference held by `token`. Aborts if `token` is not a live
/// token of `kind`.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_release(kind: i32, token: u64) -> i32 {
	let kind = kind_arg("release", kind);
	with_host("release", |host| host.tokens.release(kind, token))
}

#[unsafe(no_mangle)]
pub extern "C" fn cef_host_initialize(app: u64) -> i32 {
	with_host("initialize", |host| {
		let app = host.tokens.app(app)?;
		host.process.initialize(&app)
	})
}

/// Creates a browser through `client` at `url`.
///
/// # Safety
///
/// `url` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_create_browser(client: u64, url: *const c_char) -> u64 {
	let url = unsafe { str_arg(url, "url") };
	issue("create browser", |host| {
		let client = host.tokens.client(client)?;
		host.process.create_browser(&client, url?).map(Held::from)
	})
}

/// Engine identifier of `browser`, or a negative status.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_browser_get_identifier(browser: u64) -> i32 {
	match host().and_then(|host| host.tokens.browser(browser)?.identifier()) {
		Ok(id) => id,
		Err(err) => failure("get browser identifier", err),
	}
}

/// # Safety
///
/// `url` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_browser_load_url(browser: u64, url: *const c_char) -> i32 {
	let url = unsafe { str_arg(url, "url") };
	with_host("load url", |host| host.tokens.browser(browser)?.load_url(url?))
}

/// # Safety
///
/// `code` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_browser_execute_javascript(browser: u64, code: *const c_char) -> i32 {
	let code = unsafe { str_arg(code, "code") };
	with_host("execute javascript", |host| host.tokens.browser(browser)?.execute_script(code?))
}

#[unsafe(no_mangle)]
pub extern "C" fn cef_host_browser_send_click(browser: u64, x: i32, y: i32) -> i32 {
	with_host("send click", |host| host.tokens.browser(browser)?.send_click(x, y))
}

/// # Safety
///
/// `text` must be a NUL-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_browser_send_text(browser: u64, text: *const c_char) -> i32 {
	let text = unsafe { str_arg(text, "text") };
	with_host("send text", |host| host.tokens.browser(browser)?.send_text(text?))
}

#[unsafe(no_mangle)]
pub extern "C" fn cef_host_browser_reload(browser: u64) -> i32 {
	with_host("reload", |host| host.tokens.browser(browser)?.reload())
}

#[unsafe(no_mangle)]
pub extern "C" fn cef_host_browser_was_resized(browser: u64) -> i32 {
	with_host("notify resized", |host| host.tokens.browser(browser)?.notify_resized())
}

/// Requests a forced close. The token stays valid and must still be released.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_browser_close(browser: u64) -> i32 {
	with_host("close browser", |host| host.tokens.browser(browser)?.close())
}

/// Performs one slice of engine work.
#[unsafe(no_mangle)]
pub extern "C" fn cef_host_step() -> i32 {
	with_host("step", |host| host.process.pump())
}

#[unsafe(no_mangle)]
pub extern "C" fn cef_host_shutdown() -> i32 {
	with_host("shutdown", |host| host.process.shutdown_engine())
}

/// Appends `switch` to the list handed to a before-command-line callback.
///
/// # Safety
///
/// `switches` must be the pointer received by that callback, used during the
/// call; `switch` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_command_line_append(switches: *mut CefHostSwitches, switch: *const c_char) -> i32 {
	if switches.is_null() {
		return failure("append switch", Error::InvalidArgument("switch list is null".into()));
	}
	match unsafe { str_arg(switch, "switch") } {
		Ok(switch) => {
			unsafe { &mut *switches }.push(switch.to_string());
			CEF_HOST_OK
		}
		Err(err) => failure("append switch", err),
	}
}

/// Drops the capabilities reference owned by a destroyed native object.
///
/// # Safety
///
/// `capabilities` must be a pointer received by `create_app` or
/// `create_client`, released exactly once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cef_host_capabilities_release(capabilities: *const c_void) {
	if capabilities.is_null() {
		return;
	}
	drop(unsafe { Arc::from_raw(capabilities.cast::<Capabilities>()) });
}
