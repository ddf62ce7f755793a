//! # Shared chain context.
//!
//! A [`Context`] is the mutable key/value state every action of one chain reads
//! and writes. Keys are strings, values are [`serde_json::Value`]s.
//!
//! A context is a cheap handle: cloning it shares the same underlying map, so the
//! clone an action moves into a spawned future writes to the very map the next
//! action (and the terminal callback) will read.
//!
//! When a chain fails, the reason is stored under [`FAILURE_KEY`].
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use taskchain::Context;
//!
//! let ctx = Context::new();
//! let shared = ctx.clone();
//!
//! shared.put("user", "ada");
//! shared.push("seen", 1);
//! shared.push("seen", 2);
//!
//! assert_eq!(ctx.get_str("user").as_deref(), Some("ada"));
//! assert_eq!(ctx.get("seen"), Some(json!([1, 2])));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

/// Reserved context key holding the human-readable failure reason.
pub const FAILURE_KEY: &str = "failure";

/// Shared, mutable key/value state of one chain.
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.lock().insert(key.into(), value.into())
    }

    /// Returns a clone of the value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.lock()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Whether a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Appends `value` to the array stored under `key`.
    ///
    /// A missing key starts a new array; a non-array value is replaced by
    /// an array holding only `value`.
    pub fn push(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut map = self.lock();
        let slot = map
            .entry(key.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value.into()),
            other => *other = Value::Array(vec![value.into()]),
        }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs `f` with exclusive access to the map.
    ///
    /// Use it for read-modify-write sequences that must not interleave with
    /// writes from parallel sibling actions. Do not call back into the same
    /// context from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Returns a point-in-time copy of the whole map.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    /// The recorded failure reason, if the chain failed.
    pub fn failure(&self) -> Option<String> {
        self.get_str(FAILURE_KEY)
    }

    /// Whether two handles point at the same underlying map.
    pub fn same_as(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&*self.lock()).finish()
    }
}
