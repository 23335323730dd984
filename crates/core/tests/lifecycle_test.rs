// Integration tests for the process and browser state machines.
//
// Tests cover:
// - initialize / shutdown transitions and their refusals
// - browser creation, identifiers and close confirmation
// - commands on closing and closed browsers
// - closed browsers whose identifier the engine hands out again
// - pumping before initialization

mod support;

use std::sync::Arc;

use cef_host::{BrowserOptions, BrowserState, Capabilities, Error, ExtraInfo, ProcessState};
use cef_host_runtime::testing::Call;
use parking_lot::Mutex;
use support::{primary, running};

#[test]
fn test_initialize_applies_embedding_policy() -> anyhow::Result<()> {
	let (engine, process) = primary();
	let app = process.create_application(Capabilities::new())?;
	assert_eq!(process.state(), ProcessState::Uninitialized);

	process.initialize(&app)?;

	assert_eq!(process.state(), ProcessState::Initialized);
	let settings = engine
		.calls()
		.into_iter()
		.find_map(|call| match call {
			Call::Initialize { settings } => Some(settings),
			_ => None,
		})
		.expect("initialize was called");
	assert!(settings.no_sandbox);
	assert!(settings.windowless_rendering_enabled);
	assert!(settings.external_message_pump);
	assert!(!settings.multi_threaded_message_loop);
	assert_eq!(settings.log_file.to_str(), Some("cef-binary.log"));
	Ok(())
}

#[test]
fn test_initialize_twice_fails() -> anyhow::Result<()> {
	let (_engine, process) = primary();
	let app = process.create_application(Capabilities::new())?;
	process.initialize(&app)?;

	let err = process.initialize(&app).unwrap_err();

	assert!(matches!(err, Error::Initialization(_)), "{err:?}");
	assert_eq!(process.state(), ProcessState::Initialized);
	Ok(())
}

#[test]
fn test_engine_refusal_leaves_state_untouched() -> anyhow::Result<()> {
	let (engine, process) = primary();
	let app = process.create_application(Capabilities::new())?;
	engine.fail_initialize(true);

	let err = process.initialize(&app).unwrap_err();

	assert!(matches!(err, Error::Initialization(_)));
	assert_eq!(process.state(), ProcessState::Uninitialized);

	// The application was not retained: dropping it destroys it.
	drop(app);
	assert_eq!(engine.live_objects(), 0);
	Ok(())
}

#[test]
fn test_pump_before_initialize_is_invalid_state() {
	let (engine, process) = primary();

	let err = process.pump().unwrap_err();

	assert!(err.is_invalid_state(), "{err:?}");
	assert!(!engine.calls().contains(&Call::DoMessageLoopWork));
}

#[test]
fn test_browsers_get_distinct_identifiers() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;

	let browsers = (0..3)
		.map(|i| rt.process.create_browser(&rt.client, &format!("https://example.com/{i}")))
		.collect::<Result<Vec<_>, _>>()?;
	let mut ids = browsers
		.iter()
		.map(|b| b.identifier())
		.collect::<Result<Vec<_>, _>>()?;
	ids.dedup();

	assert_eq!(ids.len(), 3);
	assert_eq!(rt.process.open_browsers(), ids);
	for browser in &browsers {
		assert_eq!(browser.state(), BrowserState::Live);
		// Stable across reads.
		assert_eq!(browser.identifier()?, browser.identifier()?);
	}
	Ok(())
}

#[test]
fn test_create_browser_uses_windowless_defaults() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;

	rt.process.create_browser(&rt.client, "https://example.com")?;

	match rt.engine.calls().last() {
		Some(Call::CreateBrowser {
			url,
			window,
			settings,
			extra_info,
		}) => {
			assert_eq!(url, "https://example.com");
			assert!(window.windowless);
			assert_eq!(window.parent_window, 0);
			assert_eq!(settings.windowless_frame_rate, 30);
			assert!(extra_info.is_empty());
		}
		other => panic!("unexpected last call {other:?}"),
	}
	Ok(())
}

#[test]
fn test_extra_info_is_passed_through() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let mut extra = ExtraInfo::new();
	extra.set_int("bap", 23);
	let options = BrowserOptions::default().with_extra_info(extra.clone()).with_frame_rate(60);

	rt.process.create_browser_with(&rt.client, "about:blank", options)?;

	let passed = rt.engine.calls().into_iter().find_map(|call| match call {
		Call::CreateBrowser {
			extra_info, settings, ..
		} => Some((extra_info, settings)),
		_ => None,
	});
	let (info, settings) = passed.expect("create_browser was called");
	assert_eq!(info, extra);
	assert_eq!(info.get_int("bap"), Some(23));
	assert_eq!(settings.windowless_frame_rate, 60);
	Ok(())
}

#[test]
fn test_create_browser_requires_initialized() -> anyhow::Result<()> {
	let (engine, process) = primary();
	let client = process.create_client(Capabilities::new())?;

	let err = process.create_browser(&client, "about:blank").unwrap_err();

	assert!(err.is_invalid_state());
	assert!(!engine.calls().iter().any(|c| matches!(c, Call::CreateBrowser { .. })));
	Ok(())
}

#[test]
fn test_engine_refusing_browser_retains_nothing() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	rt.engine.fail_create_browser(true);

	let err = rt.process.create_browser(&rt.client, "about:blank").unwrap_err();

	assert!(matches!(err, Error::BrowserCreation(_)));
	assert!(rt.process.open_browsers().is_empty());
	Ok(())
}

#[test]
fn test_close_is_confirmed_by_before_close() -> anyhow::Result<()> {
	let closed = Arc::new(Mutex::new(Vec::new()));
	let seen = Arc::clone(&closed);
	let caps = Capabilities::builder()
		.on_before_close(move |e| seen.lock().push(e.browser_id))
		.build();
	let rt = running(caps)?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;

	browser.close()?;
	assert_eq!(browser.state(), BrowserState::Closing);
	assert!(
		rt.engine
			.browser_calls(id)
			.contains(&Call::CloseBrowser { browser_id: id, force: true })
	);

	rt.process.pump()?;

	assert_eq!(browser.state(), BrowserState::Closed);
	assert_eq!(*closed.lock(), vec![id]);
	assert!(rt.process.open_browsers().is_empty());
	Ok(())
}

#[test]
fn test_commands_after_close_are_invalid_state() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	browser.close()?;

	for result in [
		browser.identifier().map(|_| ()),
		browser.load_url("https://example.com"),
		browser.execute_script("1"),
		browser.send_click(1, 1),
		browser.send_text("x"),
		browser.reload(),
		browser.notify_resized(),
		browser.close(),
	] {
		assert!(result.unwrap_err().is_invalid_state());
	}

	rt.process.pump()?;
	assert!(browser.reload().unwrap_err().is_invalid_state());
	assert!(browser.close().unwrap_err().is_invalid_state());
	Ok(())
}

#[test]
fn test_closing_one_browser_leaves_others_live() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let first = rt.process.create_browser(&rt.client, "about:blank")?;
	let second = rt.process.create_browser(&rt.client, "about:blank")?;

	first.close()?;
	rt.process.pump()?;

	assert_eq!(first.state(), BrowserState::Closed);
	assert_eq!(second.state(), BrowserState::Live);
	second.reload()?;
	Ok(())
}

#[test]
fn test_closed_browser_stays_closed_when_identifier_is_reused() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	rt.engine.reuse_browser_id(7);
	let first = rt.process.create_browser(&rt.client, "about:blank")?;
	first.close()?;
	rt.process.pump()?;
	assert_eq!(first.state(), BrowserState::Closed);

	let second = rt.process.create_browser(&rt.client, "about:blank")?;
	assert_eq!(second.identifier()?, 7);
	rt.engine.take_calls();

	assert!(first.reload().unwrap_err().is_invalid_state());
	assert!(first.identifier().unwrap_err().is_invalid_state());
	assert_eq!(first.state(), BrowserState::Closed);
	assert!(rt.engine.take_calls().is_empty());

	second.reload()?;
	assert_eq!(rt.engine.take_calls(), vec![Call::Reload { browser_id: 7 }]);
	Ok(())
}

#[test]
fn test_shutdown_with_live_browser_is_invalid_state() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let _browser = rt.process.create_browser(&rt.client, "about:blank")?;

	let err = rt.process.shutdown().unwrap_err();

	assert!(err.is_invalid_state());
	assert_eq!(rt.process.state(), ProcessState::Initialized);
	assert!(!rt.engine.calls().contains(&Call::Shutdown));
	Ok(())
}

#[test]
fn test_shutdown_waits_for_close_confirmation() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	browser.close()?;

	assert!(rt.process.shutdown().unwrap_err().is_invalid_state());

	rt.process.pump()?;
	rt.process.shutdown_engine()?;

	assert_eq!(rt.process.state(), ProcessState::Terminated);
	assert!(rt.engine.calls().contains(&Call::Shutdown));
	Ok(())
}

#[test]
fn test_shutdown_requires_initialized() {
	let (_engine, process) = primary();

	assert!(process.shutdown().unwrap_err().is_invalid_state());
	assert_eq!(process.state(), ProcessState::Uninitialized);
}

#[test]
fn test_terminated_engine_refuses_pump_and_can_reinitialize() -> anyhow::Result<()> {
	let rt = running(Capabilities::new())?;
	rt.process.shutdown()?;

	assert!(rt.process.pump().unwrap_err().is_invalid_state());
	assert!(rt.process.shutdown().unwrap_err().is_invalid_state());

	rt.process.initialize(&rt.app)?;
	assert_eq!(rt.process.state(), ProcessState::Initialized);
	Ok(())
}

#[test]
fn test_callbacks_fire_during_pump() -> anyhow::Result<()> {
	let log = Arc::new(Mutex::new(Vec::<String>::new()));
	let (created, loaded, painted) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
	let caps = Capabilities::builder()
		.on_after_created(move |e| created.lock().push(format!("created {}", e.browser_id)))
		.on_load_end(move |e| loaded.lock().push(format!("loaded {} {}", e.browser_id, e.http_status_code)))
		.on_paint(move |frame| {
			painted
				.lock()
				.push(format!("paint {} {}x{} {}", frame.browser_id, frame.width, frame.height, frame.pixels.len()))
		})
		.build();
	let rt = running(caps)?;
	let browser = rt.process.create_browser(&rt.client, "about:blank")?;
	let id = browser.identifier()?;
	browser.load_url("https://example.com")?;
	rt.engine.queue_paint(id, 4, 2);
	assert!(log.lock().is_empty());

	rt.process.pump()?;

	assert_eq!(
		*log.lock(),
		vec![
			format!("created {id}"),
			format!("loaded {id} 200"),
			format!("paint {id} 4x2 32"),
		]
	);
	Ok(())
}
