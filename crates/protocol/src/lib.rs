//! Plain data types exchanged with the embedded browser engine.
//!
//! Everything here is inert data: the settings handed to the engine at
//! initialization, the parameters of a browser creation request, synthesized
//! input events, the launch role of the current process and the events the
//! engine reports back through the host's callback table.
//!
//! Types in this crate are:
//! - **Pure data**: no behavior beyond construction helpers and serde
//! - **Engine-shaped**: field names follow the engine's own structures
//!
//! Lifecycle and ownership live in `cef-host-runtime` and `cef-host`.

pub mod browser;
pub mod events;
pub mod input;
pub mod process;
pub mod settings;

pub use browser::*;
pub use events::*;
pub use input::*;
pub use process::*;
pub use settings::*;
