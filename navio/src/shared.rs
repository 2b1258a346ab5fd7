//! Identity-compared shared handles for closures and layout data.
//!
//! ## Usage
//!
//! Wrap renderers, option functions and inline definitions so they can be
//! compared and hashed cheaply (by pointer) when the resolver memoizes.

use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Deserializer};

/// Shared handle that compares by identity (`Arc::ptr_eq`) instead of by value.
///
/// Two handles are equal only when they point at the same allocation, which
/// makes `Shared` usable as a memoization key for values that have no
/// meaningful structural equality, such as closures.
pub struct Shared<T: ?Sized> {
    inner: Arc<T>,
}

impl<T> Shared<T> {
    /// Move a value into a new shared allocation.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl<T: ?Sized> Shared<T> {
    /// Wrap an existing shared allocation.
    pub fn from_shared(inner: Arc<T>) -> Self {
        Self { inner }
    }

    /// Clone the underlying `Arc`.
    pub fn shared(&self) -> Arc<T> {
        Arc::clone(&self.inner)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for Shared<T> {}

impl<T: ?Sized> Hash for Shared<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Shared<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Shared::new)
    }
}

/// Stable, comparable callback handle for `Fn()`.
///
/// Layout hooks use this type: they run every time a container is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Callback {
    slot: Shared<dyn Fn() + Send + Sync>,
}

impl Callback {
    /// Create a callback handle from a closure.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            slot: Shared::from_shared(Arc::new(handler)),
        }
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (*self.slot)();
    }
}

impl<F> From<F> for Callback
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}
