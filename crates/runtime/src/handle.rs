//! Ownership bridge between engine handles and host-owned tokens.
//!
//! Engine objects are intrusively reference counted: the object carries its
//! own count and destroys itself when the count reaches zero. A [`Token`]
//! pairs one such object with exactly one outstanding increment:
//!
//! - [`Token::wrap`] increments, [`Token::adopt`] takes over an increment the
//!   engine already performed
//! - dropping or [`Token::release`]-ing the token decrements exactly once
//! - cloning runs the increment again, so every clone owns its own reference
//!
//! Nothing else in the workspace touches the count. [`Token::handle`] hands
//! out the raw handle for the duration of a single engine call.

use std::ffi::c_void;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use tracing::trace;

/// Private module for the sealed trait pattern.
mod private {
    pub trait Sealed {}
}

/// Runtime tag of a handle kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum Kind {
    App = 0,
    Client = 1,
    Browser = 2,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::App => "application",
            Kind::Client => "client",
            Kind::Browser => "browser",
        }
    }

    /// Parses the tag used across the C boundary.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Kind::App),
            1 => Some(Kind::Client),
            2 => Some(Kind::Browser),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile-time handle kind. Sealed: only the three engine kinds exist.
pub trait HandleKind: private::Sealed + Send + Sync + 'static {
    const KIND: Kind;
}

/// Application object (process-level callbacks).
#[derive(Debug)]
pub enum AppKind {}

/// Client object (browser-level callbacks).
#[derive(Debug)]
pub enum ClientKind {}

/// Browser instance.
#[derive(Debug)]
pub enum BrowserKind {}

impl private::Sealed for AppKind {}
impl private::Sealed for ClientKind {}
impl private::Sealed for BrowserKind {}

impl HandleKind for AppKind {
    const KIND: Kind = Kind::App;
}

impl HandleKind for ClientKind {
    const KIND: Kind = Kind::Client;
}

impl HandleKind for BrowserKind {
    const KIND: Kind = Kind::Browser;
}

/// Non-null pointer to an engine object. Never dereferenced on this side.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

// The engine's counts are atomic and its objects are thread-safe to address;
// this side only ever passes the pointer back to the engine.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    /// Returns `None` for a null pointer.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:p})", self.0)
    }
}

/// Intrusive reference counting as exposed by the engine.
pub trait RefCount: Send + Sync {
    /// Increments the count of `handle`. Cannot fail.
    fn add_ref(&self, kind: Kind, handle: RawHandle);

    /// Decrements the count of `handle`. Returns true when this released the
    /// last reference and the object was destroyed.
    fn release(&self, kind: Kind, handle: RawHandle) -> bool;
}

/// Host-owned reference to an engine object of kind `K`.
pub struct Token<K: HandleKind> {
    handle: RawHandle,
    refs: Arc<dyn RefCount>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind> Token<K> {
    /// Takes a new reference to `handle`.
    pub fn wrap(refs: Arc<dyn RefCount>, handle: RawHandle) -> Self {
        refs.add_ref(K::KIND, handle);
        trace!(target: "cef_host", kind = %K::KIND, handle = ?handle, "wrap");
        Self {
            handle,
            refs,
            _kind: PhantomData,
        }
    }

    /// Takes ownership of a reference the engine already counted for the caller,
    /// typically the result of a creation call.
    ///
    /// # Safety
    ///
    /// `handle` must carry one increment that nobody else will release.
    pub unsafe fn adopt(refs: Arc<dyn RefCount>, handle: RawHandle) -> Self {
        trace!(target: "cef_host", kind = %K::KIND, handle = ?handle, "adopt");
        Self {
            handle,
            refs,
            _kind: PhantomData,
        }
    }

    /// The underlying handle, for one engine call. Does not touch the count.
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    pub fn kind(&self) -> Kind {
        K::KIND
    }

    /// Gives the reference back. Equivalent to dropping the token.
    pub fn release(self) {
        drop(self);
    }

    /// Returns true if both tokens refer to the same engine object.
    pub fn same_object(&self, other: &Token<K>) -> bool {
        self.handle == other.handle
    }
}

impl<K: HandleKind> Clone for Token<K> {
    fn clone(&self) -> Self {
        Self::wrap(Arc::clone(&self.refs), self.handle)
    }
}

impl<K: HandleKind> Drop for Token<K> {
    fn drop(&mut self) {
        let destroyed = self.refs.release(K::KIND, self.handle);
        trace!(target: "cef_host", kind = %K::KIND, handle = ?self.handle, destroyed, "release");
    }
}

impl<K: HandleKind> PartialEq for Token<K> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<K: HandleKind> Eq for Token<K> {}

impl<K: HandleKind> Hash for Token<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<K: HandleKind> fmt::Debug for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &K::KIND)
            .field("handle", &self.handle)
            .finish()
    }
}
