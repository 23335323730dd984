//! [`EngineProcess`]: the process-wide engine state machine.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use cef_host_protocol::{BrowserOptions, MainArgs, Settings};
use cef_host_runtime::{
	AppKind, BrowserKind, BrowserRegistry, BrowserState, Capabilities, ClientKind, Engine, Error, RawHandle, RefCount,
	Result, Subscription, Token, get_subprocess_executable, ref_counter,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::app::{Application, Client};
use crate::browser::Browser;

/// Lifecycle of the engine within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
	Uninitialized,
	Initialized,
	ShuttingDown,
	Terminated,
}

impl fmt::Display for ProcessState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ProcessState::Uninitialized => "Uninitialized",
			ProcessState::Initialized => "Initialized",
			ProcessState::ShuttingDown => "ShuttingDown",
			ProcessState::Terminated => "Terminated",
		};
		f.write_str(s)
	}
}

/// The embedded engine as driven by this process.
///
/// Create exactly one per process. All methods expect to be called from the
/// host's main loop; none of them block.
///
/// ```ignore
/// let process = EngineProcess::new(engine);
/// let code = process.run_subprocess_entry();
/// if code >= 0 {
///     std::process::exit(code);
/// }
///
/// let caps = Capabilities::builder().on_paint(|frame| upload(frame)).build();
/// let app = process.create_application(caps.clone())?;
/// process.initialize(&app)?;
/// let client = process.create_client(caps)?;
/// let browser = process.create_browser(&client, "https://example.com")?;
/// loop {
///     process.pump()?;
/// }
/// ```
pub struct EngineProcess {
	engine: Arc<dyn Engine>,
	refs: Arc<dyn RefCount>,
	args: MainArgs,
	state: Mutex<ProcessState>,
	/// Application bound to the current initialization.
	active_app: Mutex<Option<Application>>,
	browsers: Arc<BrowserRegistry>,
	/// Before-close hooks keeping `browsers` in sync, one per live client callback table.
	close_hooks: Mutex<Vec<(Weak<Capabilities>, Subscription)>>,
	/// Result of the one sub-process dispatch.
	subprocess_exit: OnceLock<i32>,
}

impl EngineProcess {
	/// Drives `engine` with the command line of the running process.
	pub fn new(engine: Arc<dyn Engine>) -> Self {
		Self::with_args(engine, MainArgs::from_env())
	}

	/// Drives `engine` with an explicit command line.
	pub fn with_args(engine: Arc<dyn Engine>, args: MainArgs) -> Self {
		let refs = ref_counter(&engine);
		Self {
			engine,
			refs,
			args,
			state: Mutex::new(ProcessState::Uninitialized),
			active_app: Mutex::new(None),
			browsers: Arc::new(BrowserRegistry::new()),
			close_hooks: Mutex::new(Vec::new()),
			subprocess_exit: OnceLock::new(),
		}
	}

	pub fn state(&self) -> ProcessState {
		*self.state.lock()
	}

	pub fn args(&self) -> &MainArgs {
		&self.args
	}

	pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
		&self.engine
	}

	pub(crate) fn subprocess_exit(&self) -> &OnceLock<i32> {
		&self.subprocess_exit
	}

	/// Identifiers of browsers that have not finished closing.
	pub fn open_browsers(&self) -> Vec<i32> {
		self.browsers.active_ids()
	}

	/// Allocates an application object bound to `capabilities`.
	///
	/// Valid in any state; does not change it.
	pub fn create_application(&self, capabilities: Arc<Capabilities>) -> Result<Application> {
		let raw = self
			.engine
			.create_app(Arc::clone(&capabilities))
			.ok_or(Error::NullHandle { kind: "application" })?;
		let token = unsafe { self.adopt::<AppKind>(raw) };
		debug!(target: "cef_host", handle = ?raw, "application created");
		Ok(Application::new(token, capabilities))
	}

	/// Allocates a client object bound to `capabilities`.
	///
	/// Browsers created through the client report their close to this process,
	/// so the client's callback table is watched for before-close events.
	pub fn create_client(&self, capabilities: Arc<Capabilities>) -> Result<Client> {
		let raw = self
			.engine
			.create_client(Arc::clone(&capabilities))
			.ok_or(Error::NullHandle { kind: "client" })?;
		let token = unsafe { self.adopt::<ClientKind>(raw) };
		self.watch_closes(&capabilities);
		debug!(target: "cef_host", handle = ?raw, "client created");
		Ok(Client::new(token, capabilities))
	}

	/// Initializes the engine with the fixed embedding policy.
	///
	/// Valid from `Uninitialized` or `Terminated`. On failure the state is
	/// unchanged and no engine object is retained.
	pub fn initialize(&self, app: &Application) -> Result<()> {
		if let Some(code) = self.subprocess_exit.get().filter(|code| **code >= 0) {
			return Err(Error::Initialization(format!(
				"process was dispatched as a {} sub-process (exit code {code})",
				self.args.role()
			)));
		}

		let current = self.state();
		if !matches!(current, ProcessState::Uninitialized | ProcessState::Terminated) {
			return Err(Error::Initialization(format!("engine is already {current}")));
		}

		let settings = Settings::embedded(get_subprocess_executable());
		info!(
			target: "cef_host",
			subprocess = %settings.browser_subprocess_path.display(),
			log_file = %settings.log_file.display(),
			"initializing engine"
		);

		// The state lock is not held across the engine call: the engine may
		// invoke host callbacks before returning.
		if !self.engine.initialize(&self.args, &settings, app.token().handle()) {
			warn!(target: "cef_host", "engine initialization failed");
			return Err(Error::Initialization(format!(
				"engine rejected initialization (sub-process executable {})",
				settings.browser_subprocess_path.display()
			)));
		}

		*self.active_app.lock() = Some(app.clone());
		*self.state.lock() = ProcessState::Initialized;
		info!(target: "cef_host", "engine initialized");
		Ok(())
	}

	/// Creates a windowless browser at `url` with default options.
	pub fn create_browser(&self, client: &Client, url: &str) -> Result<Browser> {
		self.create_browser_with(client, url, BrowserOptions::default())
	}

	/// Creates a browser at `url`.
	///
	/// Requires `Initialized`. The browser is `Live` on return.
	pub fn create_browser_with(&self, client: &Client, url: &str, options: BrowserOptions) -> Result<Browser> {
		let current = self.state();
		if current != ProcessState::Initialized {
			return Err(Error::invalid_state("create a browser", current));
		}

		let raw = self
			.engine
			.create_browser(
				&options.window,
				client.token().handle(),
				url,
				&options.settings,
				&options.extra_info,
			)
			.ok_or_else(|| Error::BrowserCreation(format!("engine refused to create a browser for '{url}'")))?;
		let token = unsafe { self.adopt::<BrowserKind>(raw) };

		// A refused identifier drops `token`, which returns the reference.
		let id = self.engine.browser_identifier(token.handle());
		let slot = self.browsers.register(id)?;
		if let Err(err) = slot.transition(BrowserState::Requested, BrowserState::Live, "create a browser") {
			self.browsers.discard(&slot);
			return Err(err);
		}

		info!(target: "cef_host", browser_id = id, url, fps = options.settings.windowless_frame_rate, "browser created");
		Ok(Browser::new(token, slot, Arc::clone(&self.engine)))
	}

	/// Shuts the engine down.
	///
	/// Valid only from `Initialized` once every browser has closed. Runs
	/// `Initialized → ShuttingDown → Terminated` before returning.
	pub fn shutdown(&self) -> Result<()> {
		let current = self.state();
		if current != ProcessState::Initialized {
			return Err(Error::invalid_state("shut down the engine", current));
		}

		let open = self.browsers.active_ids();
		if !open.is_empty() {
			return Err(Error::invalid_state(
				"shut down the engine",
				format!("browsers {open:?} are still open"),
			));
		}

		*self.state.lock() = ProcessState::ShuttingDown;
		info!(target: "cef_host", "shutting down engine");
		self.engine.shutdown();

		self.active_app.lock().take();
		*self.state.lock() = ProcessState::Terminated;
		info!(target: "cef_host", "engine terminated");
		Ok(())
	}

	/// Subscribes the registry to before-close events of `capabilities` once.
	///
	/// Hooks of callback tables that have been dropped are pruned first, so a
	/// table allocated at a recycled address is not mistaken for a watched one.
	fn watch_closes(&self, capabilities: &Arc<Capabilities>) {
		let mut hooks = self.close_hooks.lock();
		hooks.retain(|(caps, _)| caps.strong_count() > 0);
		if hooks.iter().any(|(caps, _)| std::ptr::eq(caps.as_ptr(), Arc::as_ptr(capabilities))) {
			return;
		}

		let browsers = Arc::downgrade(&self.browsers);
		let hook = capabilities.subscribe_before_close(move |event| {
			if let Some(browsers) = browsers.upgrade() {
				browsers.mark_closed(event.browser_id);
			}
		});
		hooks.push((Arc::downgrade(capabilities), hook));
	}

	#[cfg(test)]
	fn watched_tables(&self) -> usize {
		self.close_hooks.lock().len()
	}

	/// # Safety
	///
	/// `raw` must carry one reference for the caller, as returned by an engine
	/// creation call.
	unsafe fn adopt<K: cef_host_runtime::HandleKind>(&self, raw: RawHandle) -> Token<K> {
		unsafe { Token::adopt(Arc::clone(&self.refs), raw) }
	}
}

impl Drop for EngineProcess {
	fn drop(&mut self) {
		let state = *self.state.get_mut();
		if state == ProcessState::Initialized {
			warn!(target: "cef_host", "engine process dropped without shutdown");
		}
	}
}

impl fmt::Debug for EngineProcess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EngineProcess")
			.field("state", &self.state())
			.field("role", &self.args.role())
			.field("open_browsers", &self.browsers.active_ids())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use cef_host_runtime::testing::RecordingEngine;

	use super::*;

	fn process() -> EngineProcess {
		EngineProcess::with_args(Arc::new(RecordingEngine::new()), MainArgs::new(["host"]))
	}

	#[test]
	fn clients_sharing_a_table_install_one_close_hook() {
		let process = process();
		let caps = Capabilities::new();

		let _first = process.create_client(Arc::clone(&caps)).unwrap();
		let _second = process.create_client(Arc::clone(&caps)).unwrap();
		let _other = process.create_client(Capabilities::new()).unwrap();

		assert_eq!(process.watched_tables(), 2);
	}
}
