//! Dynamically typed parameter and result bags.
//!
//! Attribute decorators inspect call arguments generically, without the
//! tracing layer knowing each operation's concrete signature. The dynamic
//! container is confined to this boundary; the wrapped client stays strongly
//! typed throughout.

use opentelemetry::global::BoxedSpan;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Translates call parameters and results into span attributes.
///
/// Bound to a [`TracedClient`](crate::TracedClient) at construction, at most
/// one per client. Invoked with `(span, params, results)` after every
/// wrapped call, on both success and error paths.
pub type AttributeDecorator = Arc<dyn Fn(&mut BoxedSpan, &Bag, &Bag) + Send + Sync>;

/// A string-keyed bag of arbitrarily typed values.
///
/// Built fresh for each wrapped call and discarded afterwards. Lookup is
/// deliberately forgiving: an absent key and a present key of the wrong type
/// both read back as `None`, so decorators can probe candidate keys
/// speculatively without handling type errors.
#[derive(Default)]
pub struct Bag {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) {
        self.values.insert(key, Box::new(value));
    }

    /// Typed lookup. `None` means absent **or** not a `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl std::fmt::Debug for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bag").field("keys", &self.values.keys()).finish()
    }
}

/// Unwrap an optional reference, falling back to the type's default.
///
/// Absent strings read as `""`, absent numbers as `0`. No failure path.
pub fn or_default<T: Default + Clone>(value: Option<&T>) -> T {
    value.cloned().unwrap_or_default()
}
