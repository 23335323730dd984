//! JavaScript execution for [`Browser`].

use cef_host_runtime::{Error, Result};
use tracing::debug;

use super::Browser;

/// First line number reported for executed scripts.
const SCRIPT_START_LINE: i32 = 0;

impl Browser {
	/// Runs `code` in the main frame. The result is discarded.
	///
	/// The frame's current URL is used as the script URL, so errors raised by
	/// the script are attributed to the page.
	///
	/// # Errors
	///
	/// Returns [`Error::NoFrame`] if the main frame is not available.
	pub fn execute_script(&self, code: &str) -> Result<()> {
		self.ensure_live("execute a script")?;

		let raw = self.raw();
		let script_url = self
			.engine
			.main_frame_url(raw)
			.ok_or(Error::NoFrame { browser_id: self.id })?;

		if !self
			.engine
			.execute_javascript(raw, code, &script_url, SCRIPT_START_LINE)
		{
			return Err(Error::NoFrame { browser_id: self.id });
		}
		debug!(target: "cef_host", browser_id = self.id, bytes = code.len(), url = %script_url, "script executed");
		Ok(())
	}
}
