// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use cef_host::{Application, Capabilities, Client, Engine, EngineProcess, MainArgs};
use cef_host_runtime::testing::RecordingEngine;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter("cef_host=trace")
		.with_test_writer()
		.try_init();
}

/// A primary-process controller over a fresh recording engine.
pub fn primary() -> (Arc<RecordingEngine>, EngineProcess) {
	with_args(["host"])
}

pub fn with_args<const N: usize>(args: [&str; N]) -> (Arc<RecordingEngine>, EngineProcess) {
	init_tracing();
	let engine = Arc::new(RecordingEngine::new());
	let dyn_engine: Arc<dyn Engine> = engine.clone();
	let process = EngineProcess::with_args(dyn_engine, MainArgs::new(args));
	(engine, process)
}

pub struct Running {
	pub engine: Arc<RecordingEngine>,
	pub process: EngineProcess,
	pub app: Application,
	pub client: Client,
}

/// An initialized controller with one client bound to `capabilities`.
pub fn running(capabilities: Arc<Capabilities>) -> anyhow::Result<Running> {
	let (engine, process) = primary();
	let app = process.create_application(Capabilities::new())?;
	process.initialize(&app)?;
	let client = process.create_client(capabilities)?;
	Ok(Running {
		engine,
		process,
		app,
		client,
	})
}
