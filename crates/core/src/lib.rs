//! Host-side control of an embedded, multi-process browser engine.
//!
//! `cef_host` sits between a host application and the engine's native
//! interface. It owns three concerns:
//!
//! - **Ownership**: engine objects are intrusively reference counted; the host
//!   only ever holds them through [`Application`], [`Client`] and [`Browser`]
//!   values, each of which owns exactly one reference.
//! - **Lifecycle**: [`EngineProcess`] drives the process-wide state machine
//!   (`Uninitialized → Initialized → ShuttingDown → Terminated`) and creates
//!   browsers, which move through `Requested → Live → Closing → Closed`.
//! - **Loop driving**: the engine runs without a message-loop thread of its
//!   own. The host calls [`EngineProcess::pump`] from its loop and receives
//!   callbacks from inside that call.
//!
//! # Entry point
//!
//! The engine launches helper processes from the same executable. The host's
//! `main` must dispatch them before doing anything else:
//!
//! ```ignore
//! let process = EngineProcess::new(engine);
//! let code = process.run_subprocess_entry();
//! if code != PRIMARY_PROCESS {
//!     std::process::exit(code);
//! }
//! ```

mod app;
mod browser;
mod process;
mod pump;

pub use app::{Application, Client};
pub use browser::{Browser, click_events, text_events};
pub use cef_host_protocol::{
	BrowserEvent, BrowserOptions, BrowserSettings, ExtraInfo, KeyEvent, KeyEventKind, LoadEndEvent, MainArgs,
	MouseButton, MouseClick, MouseEvent, PaintEvent, ProcessMessage, ProcessRole, Settings, WindowInfo,
};
pub use cef_host_runtime::{
	BrowserState, Capabilities, CapabilitiesBuilder, Engine, Error, Kind, RawHandle, RefCount, Result, Subscription,
};
pub use process::{EngineProcess, ProcessState};
pub use pump::PRIMARY_PROCESS;
