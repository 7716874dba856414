//! Caller-supplied configuration shared by every invocation of one wrap.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hookwrap_core::Value;
use parking_lot::RwLock;

/// Shared handle to a named configuration map.
///
/// Cloning the handle shares the map: a value set through one clone is
/// visible through every other. All members of one wrapped aggregate, and
/// all calls of one wrapped target, see the same handle. Use [`fork`] to get
/// an independent map with the same starting values.
///
/// [`fork`]: Extras::fork
#[derive(Clone, Default)]
pub struct Extras {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Extras {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle over an existing map.
    #[must_use]
    pub fn from_map(map: BTreeMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.set(key, value);
        self
    }

    /// Clone of the value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Insert `value`, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.write().insert(key.into(), value.into())
    }

    /// Remove `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    /// Replace the value under `key` with `f(current)` atomically, returning
    /// the new value.
    ///
    /// `f` runs under the write lock and must not touch this map through any
    /// handle; that deadlocks. Use [`update_with`](Self::update_with) to read
    /// other keys in the same step.
    pub fn update<F>(&self, key: impl Into<String>, f: F) -> Value
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let key = key.into();
        let mut map = self.inner.write();
        let next = f(map.get(&key));
        let _ = map.insert(key, next.clone());
        next
    }

    /// Run `f` on the whole map under the write lock, returning its result.
    pub fn update_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BTreeMap<String, Value>) -> R,
    {
        f(&mut self.inner.write())
    }

    /// The shared object under `key`, if it holds a `T`.
    pub fn object<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.inner.read().get(key).and_then(Value::downcast::<T>)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Present keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy of the current map.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner.read().clone()
    }

    /// Independent handle starting from the current values. Object values
    /// keep pointing at the same shared objects.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::from_map(self.snapshot())
    }

    /// Whether both handles share one map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Extras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hookwrap_core::Object;

    use super::*;

    #[test]
    fn clones_share_state() {
        let a = Extras::new();
        let b = a.clone();
        let _ = a.set("x", 1);
        assert_eq!(b.get("x"), Some(Value::Int(1)));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn fork_is_independent() {
        let a = Extras::new().with("x", 1);
        let b = a.fork();
        let _ = b.set("x", 2);
        assert_eq!(a.get("x"), Some(Value::Int(1)));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn fork_shares_objects() {
        let counter = Arc::new(AtomicUsize::new(0));
        let a = Extras::new().with("counter", Object::from_arc(Arc::clone(&counter)));
        let b = a.fork();
        let _ = b
            .object::<AtomicUsize>("counter")
            .unwrap()
            .fetch_add(1, Ordering::SeqCst);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_counts() {
        let extras = Extras::new();
        for _ in 0..3 {
            let _ = extras.update("n", |v| {
                Value::Int(v.and_then(Value::as_int).unwrap_or(0) + 1)
            });
        }
        assert_eq!(extras.get("n"), Some(Value::Int(3)));
    }

    #[test]
    fn object_requires_matching_type() {
        let extras = Extras::new().with("s", Object::new(String::from("hi")));
        assert!(extras.object::<String>("s").is_some());
        assert!(extras.object::<u32>("s").is_none());
        assert!(extras.object::<String>("missing").is_none());
    }

    #[test]
    fn keys_and_remove() {
        let extras = Extras::new().with("b", 2).with("a", 1);
        assert_eq!(extras.keys(), vec!["a", "b"]);
        assert_eq!(extras.remove("a"), Some(Value::Int(1)));
        assert_eq!(extras.len(), 1);
        assert!(!extras.contains("a"));
    }

    #[test]
    fn update_with_reads_other_keys_in_one_step() {
        let extras = Extras::new().with("b", 4).with("a", 1);
        let total = extras.update_with(|map| {
            let b = map.get("b").and_then(Value::as_int).unwrap_or(0);
            let a = map.get("a").and_then(Value::as_int).unwrap_or(0);
            let _ = map.insert("a".into(), Value::Int(a + b));
            a + b
        });
        assert_eq!(total, 5);
        assert_eq!(extras.get("a"), Some(Value::Int(5)));
        assert_eq!(extras.get("b"), Some(Value::Int(4)));
    }
}
