// Integration tests for navigation, script execution and synthesized input.

mod support;

use cef_host::{Capabilities, Error, KeyEventKind, MouseButton};
use cef_host_runtime::testing::Call;
use support::running;

#[test]
fn test_send_click_is_press_then_release() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;
	rt.engine.take_calls();

	browser.send_click(40, 60)?;

	let clicks: Vec<_> = rt
		.engine
		.browser_calls(id)
		.into_iter()
		.filter_map(|call| match call {
			Call::MouseClick { click, .. } => Some(click),
			_ => None,
		})
		.collect();
	assert_eq!(clicks.len(), 2);
	assert!(!clicks[0].mouse_up);
	assert!(clicks[1].mouse_up);
	for click in &clicks {
		assert_eq!((click.event.x, click.event.y), (40, 60));
		assert_eq!(click.button, MouseButton::Left);
		assert_eq!(click.click_count, 1);
	}
	Ok(())
}

#[test]
fn test_send_click_button_uses_requested_button() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;

	browser.send_click_button(1, 2, MouseButton::Right)?;

	let buttons: Vec<_> = rt
		.engine
		.calls()
		.into_iter()
		.filter_map(|call| match call {
			Call::MouseClick { click, .. } => Some(click.button),
			_ => None,
		})
		.collect();
	assert_eq!(buttons, vec![MouseButton::Right, MouseButton::Right]);
	Ok(())
}

#[test]
fn test_send_text_emits_one_char_event_per_unit() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;

	browser.send_text("ab")?;

	let keys: Vec<_> = rt
		.engine
		.browser_calls(id)
		.into_iter()
		.filter_map(|call| match call {
			Call::Key { event, .. } => Some(event),
			_ => None,
		})
		.collect();
	assert_eq!(keys.len(), 2);
	assert!(keys.iter().all(|k| k.kind == KeyEventKind::Char));
	assert_eq!(keys[0].character, u16::from(b'a'));
	assert_eq!(keys[1].character, u16::from(b'b'));
	assert_eq!(keys[1].windows_key_code, i32::from(b'b'));
	Ok(())
}

#[test]
fn test_send_empty_text_sends_nothing() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	rt.engine.take_calls();

	browser.send_text("")?;

	assert!(rt.engine.calls().is_empty());
	Ok(())
}

#[test]
fn test_execute_script_uses_frame_url() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "https://example.com/start")?;
	let id = browser.identifier()?;

	browser.execute_script("document.title = 'x'")?;

	assert!(rt.engine.browser_calls(id).contains(&Call::ExecuteJavascript {
		browser_id: id,
		code: "document.title = 'x'".to_string(),
		script_url: "https://example.com/start".to_string(),
		start_line: 0,
	}));
	Ok(())
}

#[test]
fn test_execute_script_follows_navigation() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;

	browser.load_url("https://example.com/next")?;
	browser.execute_script("1 + 1")?;

	let script_url = rt.engine.browser_calls(id).into_iter().find_map(|call| match call {
		Call::ExecuteJavascript { script_url, .. } => Some(script_url),
		_ => None,
	});
	assert_eq!(script_url.as_deref(), Some("https://example.com/next"));
	Ok(())
}

#[test]
fn test_missing_frame_is_no_frame() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;
	rt.engine.remove_main_frame(id);

	let script = browser.execute_script("1").unwrap_err();
	let navigate = browser.load_url("https://example.com").unwrap_err();

	assert!(matches!(script, Error::NoFrame { browser_id } if browser_id == id));
	assert!(matches!(navigate, Error::NoFrame { .. }));
	assert!(script.is_recoverable());
	// Still live: the failure is per-operation.
	browser.reload()?;
	Ok(())
}

#[test]
fn test_reload_and_resize_pass_through() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;
	rt.engine.take_calls();

	browser.reload()?;
	browser.notify_resized()?;

	assert_eq!(
		rt.engine.calls(),
		vec![Call::Reload { browser_id: id }, Call::WasResized { browser_id: id }]
	);
	Ok(())
}
