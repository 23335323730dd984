//! C interface over `cef_host`.
//!
//! Two directions cross this boundary:
//!
//! - **Host → layer** ([`api`]): a native host attaches the engine's function
//!   table, creates objects, drives the loop and releases what it owns. Owned
//!   objects are addressed by ledger tokens.
//! - **Engine → layer** ([`dispatch`]): the native shim reports engine events
//!   through the capabilities pointer it was handed at object creation.
//!
//! Every entry point is prefixed `cef_host_`. Status codes are `0` on success
//! and negative per error class ([`status`]). Releasing a token that is not
//! owned aborts the process after logging.

pub mod api;
pub mod callbacks;
pub mod dispatch;
pub mod engine;
pub mod ledger;
mod logging;
pub mod status;

pub use api::*;
pub use callbacks::{CefHostCallbacks, CefHostSwitches};
pub use dispatch::*;
pub use engine::{CefHostEngine, CefHostKeyEvent, CefHostMouseClick, CefHostSettings, CefHostWindowInfo, ForeignEngine};
pub use ledger::{Held, TokenTable};
pub use logging::init_logging;
