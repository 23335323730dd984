//! [`Browser`]: one engine browser instance and the commands it accepts.

mod input;
mod script;

use std::fmt;
use std::sync::Arc;

use cef_host_runtime::{BrowserKind, BrowserSlot, BrowserState, Engine, Error, RawHandle, Result, Token};
use tracing::{debug, info};

pub use input::{click_events, text_events};

/// A browser created by [`EngineProcess::create_browser`](crate::EngineProcess::create_browser).
///
/// Every command requires the browser to be [`BrowserState::Live`]. After
/// [`close`](Self::close) the instance is `Closing` until the engine confirms,
/// then `Closed`; commands in either state fail with [`Error::InvalidState`].
///
/// Cloning takes another reference on the engine object; all clones observe
/// the same state. A closed instance stays closed even if the engine later
/// gives its identifier to another browser.
#[derive(Clone)]
pub struct Browser {
	token: Token<BrowserKind>,
	id: i32,
	slot: BrowserSlot,
	engine: Arc<dyn Engine>,
}

impl Browser {
	pub(crate) fn new(token: Token<BrowserKind>, slot: BrowserSlot, engine: Arc<dyn Engine>) -> Self {
		Self {
			token,
			id: slot.id(),
			slot,
			engine,
		}
	}

	/// Engine-assigned identifier, stable for the lifetime of the instance.
	pub fn identifier(&self) -> Result<i32> {
		self.ensure_live("read the identifier")?;
		Ok(self.id)
	}

	pub fn state(&self) -> BrowserState {
		self.slot.state()
	}

	/// Navigates the main frame to `url`.
	pub fn load_url(&self, url: &str) -> Result<()> {
		self.ensure_live("load a URL")?;
		if !self.engine.load_url(self.raw(), url) {
			return Err(Error::NoFrame { browser_id: self.id });
		}
		debug!(target: "cef_host", browser_id = self.id, url, "navigating");
		Ok(())
	}

	pub fn reload(&self) -> Result<()> {
		self.ensure_live("reload")?;
		self.engine.reload(self.raw());
		Ok(())
	}

	/// Tells the engine the view was resized; a new frame will be painted.
	pub fn notify_resized(&self) -> Result<()> {
		self.ensure_live("notify a resize")?;
		self.engine.was_resized(self.raw());
		Ok(())
	}

	/// Requests a forced close, skipping unload handlers and dialogs.
	///
	/// Returns once the request is issued. The instance becomes `Closed` when
	/// the engine reports before-close during a later pump.
	pub fn close(&self) -> Result<()> {
		self.slot
			.transition(BrowserState::Live, BrowserState::Closing, "close the browser")?;
		info!(target: "cef_host", browser_id = self.id, "closing browser");
		self.engine.close_browser(self.raw(), true);
		Ok(())
	}

	/// Returns true if both values refer to the same engine object.
	pub fn same_browser(&self, other: &Browser) -> bool {
		self.token.same_object(&other.token)
	}

	fn ensure_live(&self, operation: &'static str) -> Result<()> {
		self.slot.ensure_live(operation)
	}

	fn raw(&self) -> RawHandle {
		self.token.handle()
	}
}

impl fmt::Debug for Browser {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Browser")
			.field("id", &self.id)
			.field("state", &self.state())
			.field("handle", &self.token.handle())
			.finish()
	}
}
