//! Loop driver: the host's message loop is the engine's only scheduler.

use cef_host_runtime::{Error, Result};
use tracing::{debug, info, trace};

use crate::process::{EngineProcess, ProcessState};

/// Returned by [`EngineProcess::run_subprocess_entry`] when this is the
/// primary (browser) process and the host should carry on.
pub const PRIMARY_PROCESS: i32 = -1;

impl EngineProcess {
	/// Performs one slice of engine work and returns without blocking.
	///
	/// Host callbacks fire from inside this call. Call it repeatedly from the
	/// host's loop while the engine is initialized.
	pub fn pump(&self) -> Result<()> {
		let current = self.state();
		if current != ProcessState::Initialized {
			return Err(Error::invalid_state("pump the message loop", current));
		}
		trace!(target: "cef_host", "pump");
		self.engine().do_message_loop_work();
		Ok(())
	}

	/// Dispatches a sub-process launch.
	///
	/// Must run first thing in the host's entry point. For a render, GPU or
	/// other helper launch the engine runs that role to completion and the
	/// returned exit code is non-negative; the host should exit with it. For
	/// the primary process [`PRIMARY_PROCESS`] is returned.
	///
	/// The engine is consulted once; later calls return the same code.
	pub fn run_subprocess_entry(&self) -> i32 {
		*self.subprocess_exit().get_or_init(|| {
			let role = self.args().role();
			let code = self.engine().execute_process(self.args());
			if code >= 0 {
				info!(target: "cef_host", %role, exit_code = code, "sub-process finished");
				code
			} else {
				debug!(target: "cef_host", %role, "primary process");
				PRIMARY_PROCESS
			}
		})
	}

	/// Final engine teardown. See [`EngineProcess::shutdown`].
	pub fn shutdown_engine(&self) -> Result<()> {
		self.shutdown()
	}
}
