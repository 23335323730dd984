//! Token ledger: host-owned references addressed by integer ids.
//!
//! Native callers cannot hold Rust values, so each [`Application`],
//! [`Client`] or [`Browser`] they own sits in the ledger under a non-zero id.
//! Releasing an id drops the value, which returns its engine reference. An id
//! that was already released, or is presented with the wrong kind, is
//! reported as [`Error::RefcountMisuse`] for ownership calls; a released id is
//! misuse for commands too.
//!
//! Values are stored behind an [`Arc`], so a lookup never calls into the
//! engine while a map shard is locked.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cef_host::{Application, Browser, Client, Error, Kind, Result};
use dashmap::DashMap;
use tracing::trace;

/// A value held on behalf of a native caller.
#[derive(Debug, Clone)]
pub enum Held {
	App(Arc<Application>),
	Client(Arc<Client>),
	Browser(Arc<Browser>),
}

impl Held {
	pub fn kind(&self) -> Kind {
		match self {
			Held::App(_) => Kind::App,
			Held::Client(_) => Kind::Client,
			Held::Browser(_) => Kind::Browser,
		}
	}

	/// A new value for the same object, holding its own engine reference.
	fn duplicate(&self) -> Held {
		match self {
			Held::App(app) => Held::App(Arc::new(Application::clone(app))),
			Held::Client(client) => Held::Client(Arc::new(Client::clone(client))),
			Held::Browser(browser) => Held::Browser(Arc::new(Browser::clone(browser))),
		}
	}
}

impl From<Application> for Held {
	fn from(app: Application) -> Self {
		Held::App(Arc::new(app))
	}
}

impl From<Client> for Held {
	fn from(client: Client) -> Self {
		Held::Client(Arc::new(client))
	}
}

impl From<Browser> for Held {
	fn from(browser: Browser) -> Self {
		Held::Browser(Arc::new(browser))
	}
}

/// Ids handed out across the C boundary.
pub struct TokenTable {
	entries: DashMap<u64, Held>,
	next_id: AtomicU64,
}

impl Default for TokenTable {
	fn default() -> Self {
		Self {
			entries: DashMap::new(),
			next_id: AtomicU64::new(1),
		}
	}
}

impl TokenTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `held` and returns its id. Ids are never reused.
	pub fn insert(&self, held: Held) -> u64 {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		trace!(target: "cef_host", token = id, kind = %held.kind(), "token issued");
		self.entries.insert(id, held);
		id
	}

	/// Issues a second id for the object behind `id`, taking one more reference.
	pub fn add_ref(&self, kind: Kind, id: u64) -> Result<u64> {
		let held = self.checked(kind, id, "add a reference to")?;
		Ok(self.insert(held.duplicate()))
	}

	/// Drops the value behind `id`, returning its reference.
	pub fn release(&self, kind: Kind, id: u64) -> Result<()> {
		let removed = self.entries.remove_if(&id, |_, held| held.kind() == kind);
		match removed {
			Some((_, held)) => {
				trace!(target: "cef_host", token = id, %kind, "token released");
				// Dropped outside the map so the engine release runs unlocked.
				drop(held);
				Ok(())
			}
			None => Err(self.misuse(kind, id, "release")),
		}
	}

	pub fn app(&self, id: u64) -> Result<Arc<Application>> {
		match self.lookup(Kind::App, id)? {
			Held::App(app) => Ok(app),
			_ => Err(wrong_kind(Kind::App, id)),
		}
	}

	pub fn client(&self, id: u64) -> Result<Arc<Client>> {
		match self.lookup(Kind::Client, id)? {
			Held::Client(client) => Ok(client),
			_ => Err(wrong_kind(Kind::Client, id)),
		}
	}

	pub fn browser(&self, id: u64) -> Result<Arc<Browser>> {
		match self.lookup(Kind::Browser, id)? {
			Held::Browser(browser) => Ok(browser),
			_ => Err(wrong_kind(Kind::Browser, id)),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up `id` for a command. A released id is misuse; an id that was
	/// never issued or names another kind is a caller error.
	fn lookup(&self, kind: Kind, id: u64) -> Result<Held> {
		let held = self.entries.get(&id).map(|entry| entry.value().clone());
		match held {
			Some(held) if held.kind() == kind => Ok(held),
			Some(_) => Err(wrong_kind(kind, id)),
			None if self.was_issued(id) => Err(self.misuse(kind, id, "use")),
			None => Err(Error::InvalidArgument(format!("unknown {kind} token {id}"))),
		}
	}

	fn checked(&self, kind: Kind, id: u64, operation: &str) -> Result<Held> {
		let held = self.entries.get(&id).map(|entry| entry.value().clone());
		match held {
			Some(held) if held.kind() == kind => Ok(held),
			_ => Err(self.misuse(kind, id, operation)),
		}
	}

	fn misuse(&self, kind: Kind, id: u64, operation: &str) -> Error {
		let detail = match self.entries.get(&id).map(|entry| entry.value().kind()) {
			Some(actual) => format!("token {id} is a {actual}, not a {kind}"),
			None if self.was_issued(id) => format!("token {id} was already released"),
			None => format!("token {id} was never issued"),
		};
		Error::RefcountMisuse(format!("cannot {operation} {kind} token: {detail}"))
	}

	fn was_issued(&self, id: u64) -> bool {
		id != 0 && id < self.next_id.load(Ordering::Relaxed)
	}
}

fn wrong_kind(kind: Kind, id: u64) -> Error {
	Error::InvalidArgument(format!("token {id} is not a {kind}"))
}
