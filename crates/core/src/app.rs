//! [`Application`] and [`Client`]: engine objects bound to a host callback table.

use std::sync::Arc;

use cef_host_runtime::{AppKind, Capabilities, ClientKind, Token};

/// Process-level engine object. One application is bound to each
/// initialization of the engine.
///
/// Cloning takes another reference on the engine object.
#[derive(Debug, Clone)]
pub struct Application {
	token: Token<AppKind>,
	capabilities: Arc<Capabilities>,
}

impl Application {
	pub(crate) fn new(token: Token<AppKind>, capabilities: Arc<Capabilities>) -> Self {
		Self { token, capabilities }
	}

	pub(crate) fn token(&self) -> &Token<AppKind> {
		&self.token
	}

	/// Callback table this application was created with.
	pub fn capabilities(&self) -> &Arc<Capabilities> {
		&self.capabilities
	}
}

/// Browser-level engine object. Browsers are created through a client and
/// report their events to its callback table.
///
/// Cloning takes another reference on the engine object.
#[derive(Debug, Clone)]
pub struct Client {
	token: Token<ClientKind>,
	capabilities: Arc<Capabilities>,
}

impl Client {
	pub(crate) fn new(token: Token<ClientKind>, capabilities: Arc<Capabilities>) -> Self {
		Self { token, capabilities }
	}

	pub(crate) fn token(&self) -> &Token<ClientKind> {
		&self.token
	}

	/// Callback table this client was created with.
	pub fn capabilities(&self) -> &Arc<Capabilities> {
		&self.capabilities
	}
}
