//! Mouse and keyboard input methods for [`Browser`].

use cef_host_protocol::{KeyEvent, MouseButton, MouseClick, MouseEvent};
use cef_host_runtime::Result;
use tracing::trace;

use super::Browser;

/// Press then release of `button` at `(x, y)`.
pub fn click_events(x: i32, y: i32, button: MouseButton) -> [MouseClick; 2] {
	let at = MouseEvent::at(x, y);
	[MouseClick::press(at, button), MouseClick::release(at, button)]
}

/// One character event per UTF-16 code unit of `text`, in order.
///
/// Characters outside the basic multilingual plane produce two events, one
/// per surrogate.
pub fn text_events(text: &str) -> impl Iterator<Item = KeyEvent> + '_ {
	text.encode_utf16().map(KeyEvent::char_unit)
}

impl Browser {
	/// Left click at `(x, y)`: a press followed by a release, click count 1.
	pub fn send_click(&self, x: i32, y: i32) -> Result<()> {
		self.send_click_button(x, y, MouseButton::Left)
	}

	pub fn send_click_button(&self, x: i32, y: i32, button: MouseButton) -> Result<()> {
		self.ensure_live("send a click")?;
		for click in click_events(x, y, button) {
			self.engine.send_mouse_click(self.raw(), &click);
		}
		trace!(target: "cef_host", browser_id = self.id, x, y, ?button, "click");
		Ok(())
	}

	/// Types `text` as a sequence of character events.
	///
	/// Empty text sends nothing.
	pub fn send_text(&self, text: &str) -> Result<()> {
		self.ensure_live("send text")?;
		let mut sent = 0usize;
		for event in text_events(text) {
			self.engine.send_key_event(self.raw(), &event);
			sent += 1;
		}
		trace!(target: "cef_host", browser_id = self.id, units = sent, "text");
		Ok(())
	}
}
