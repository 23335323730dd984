// Integration tests for sub-process dispatch at the host entry point.

mod support;

use cef_host::{Capabilities, Error, PRIMARY_PROCESS, ProcessRole, ProcessState};
use cef_host_runtime::testing::Call;
use support::{primary, with_args};

#[test]
fn test_primary_launch_returns_negative() {
	let (engine, process) = primary();

	assert_eq!(process.run_subprocess_entry(), PRIMARY_PROCESS);
	assert_eq!(
		engine.calls(),
		vec![Call::ExecuteProcess {
			role: ProcessRole::Browser
		}]
	);
}

#[test]
fn test_renderer_launch_returns_exit_code() {
	let (engine, process) = with_args(["host", "--type=renderer", "--lang=en-US"]);
	engine.set_subprocess_exit_code(7);

	assert_eq!(process.run_subprocess_entry(), 7);
	assert_eq!(
		engine.calls(),
		vec![Call::ExecuteProcess {
			role: ProcessRole::Renderer
		}]
	);
}

#[test]
fn test_dispatch_runs_once() {
	let (engine, process) = with_args(["host", "--type", "gpu-process"]);

	let first = process.run_subprocess_entry();
	let second = process.run_subprocess_entry();

	assert_eq!(first, 0);
	assert_eq!(first, second);
	let dispatches = engine
		.calls()
		.iter()
		.filter(|c| matches!(c, Call::ExecuteProcess { .. }))
		.count();
	assert_eq!(dispatches, 1);
}

#[test]
fn test_subprocess_blocks_initialize() -> anyhow::Result<()> {
	let (engine, process) = with_args(["host", "--type=utility"]);
	assert!(process.run_subprocess_entry() >= 0);
	let app = process.create_application(Capabilities::new())?;

	let err = process.initialize(&app).unwrap_err();

	assert!(matches!(err, Error::Initialization(_)));
	assert_eq!(process.state(), ProcessState::Uninitialized);
	assert!(!engine.calls().iter().any(|c| matches!(c, Call::Initialize { .. })));
	Ok(())
}

#[test]
fn test_primary_dispatch_allows_initialize() -> anyhow::Result<()> {
	let (_engine, process) = primary();
	assert_eq!(process.run_subprocess_entry(), PRIMARY_PROCESS);
	let app = process.create_application(Capabilities::new())?;

	process.initialize(&app)?;

	assert_eq!(process.state(), ProcessState::Initialized);
	Ok(())
}

#[test]
fn test_command_line_hook_sees_role() {
	let (_engine, process) = with_args(["host", "--type=zygote"]);
	let caps = Capabilities::builder()
		.on_command_line(|role, switches| {
			if role.is_subprocess() {
				switches.push(format!("--role-seen={role}"));
			}
		})
		.build();

	let mut switches = Vec::new();
	caps.dispatch_command_line(&process.args().role(), &mut switches);

	assert_eq!(switches, vec!["--role-seen=zygote".to_string()]);
}
