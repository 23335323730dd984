//! cef-host runtime: ownership bridge, engine capability trait and registry
//!
//! This crate provides the low-level pieces the lifecycle controller in
//! `cef-host` is built from:
//!
//! - **Ownership bridge** ([`handle`]): host-owned [`Token`]s over the engine's
//!   intrusively reference-counted objects
//! - **Engine** ([`engine`]): the capability set consumed from the embedded
//!   browser engine
//! - **Capabilities** ([`capabilities`]): the host callback table the engine
//!   invokes while pumping
//! - **Registry** ([`registry`]): browser states by engine identifier
//! - **Driver** ([`driver`]): locating the sub-process executable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  cef-host   │  Lifecycle controller, loop driver
//! └──────┬──────┘
//!        │ holds Tokens, calls Engine
//! ┌──────▼──────┐
//! │ cef-host-   │  This crate
//! │  runtime    │
//! │  ┌────────┐ │
//! │  │ Token  │ │  add-ref / release discipline
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Engine │ │  opaque engine entry points
//! │  └────────┘ │
//! └──────┬──────┘
//!        │ implemented by
//! ┌──────▼──────┐
//! │ native shim │  (cef-host-ffi function table, or testing::RecordingEngine)
//! └─────────────┘
//! ```

pub mod capabilities;
pub mod driver;
pub mod engine;
pub mod error;
pub mod handle;
pub mod handlers;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export key types at crate root
pub use capabilities::{Capabilities, CapabilitiesBuilder, CommandLineFn};
pub use driver::get_subprocess_executable;
pub use engine::{Engine, ref_counter};
pub use error::{Error, Result};
pub use handle::{AppKind, BrowserKind, ClientKind, HandleKind, Kind, RawHandle, RefCount, Token};
pub use handlers::{HandlerId, Subscription};
pub use registry::{BrowserRegistry, BrowserSlot, BrowserState};
