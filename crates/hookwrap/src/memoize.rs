//! Result caching as an instead hook.
//!
//! The key is the target name plus the hook-visible arguments, so one store
//! can serve several targets (every member of a memoized aggregate, say)
//! without collisions.
//!
//! By default the receiver is not part of the key, so an instance member
//! memoized on one instance answers for every other instance called with
//! equal arguments, even when their state differs. Use
//! [`Memoize::key_receiver`] to key per instance instead. Keyed receivers
//! are held by the store until their entries are evicted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hookwrap_cache::{CacheStore, lru_cache, ttl_cache};
use hookwrap_core::{CacheKey, KeyPolicy, Result, Value};
use hookwrap_settings::CacheSettings;
use tracing::trace;

use crate::extras::Extras;
use crate::hooks::{HookSet, InsteadHook};
use crate::invocation::Invocation;
use crate::wrapper::Wrapper;

/// Store type the memoize hook writes to.
pub type MemoStore = Arc<dyn CacheStore<CacheKey, Value>>;

/// Instead hook answering from a cache store when it can.
#[derive(Clone)]
pub struct Memoize {
    store: MemoStore,
    policy: KeyPolicy,
    key_receiver: bool,
}

impl Memoize {
    /// Hook backed by `store`, keying with [`KeyPolicy::Strict`].
    #[must_use]
    pub fn new(store: MemoStore) -> Self {
        Self {
            store,
            policy: KeyPolicy::Strict,
            key_receiver: false,
        }
    }

    /// Hook backed by the store the settings describe.
    #[must_use]
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(default_store(settings))
    }

    /// Set the key policy.
    #[must_use]
    pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Include the receiver (by identity) in the key.
    #[must_use]
    pub fn key_receiver(mut self, enabled: bool) -> Self {
        self.key_receiver = enabled;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &MemoStore {
        &self.store
    }

    /// Wrapper applying this hook.
    #[must_use]
    pub fn into_wrapper(self) -> Wrapper {
        Wrapper::new(HookSet::new().with_instead(Arc::new(self)))
    }
}

impl InsteadHook for Memoize {
    fn instead(&self, invocation: &mut Invocation, _extras: &Extras) -> Result<Option<Value>> {
        let key = match invocation.receiver() {
            Some(receiver) if self.key_receiver => {
                let mut call = invocation.call_args().clone();
                call.prepend(receiver.clone());
                CacheKey::from_call(invocation.target_name(), &call, self.policy)?
            }
            _ => CacheKey::from_call(invocation.target_name(), invocation.call_args(), self.policy)?,
        };
        if let Some(hit) = self.store.get(&key) {
            trace!(callable = invocation.target_name(), key = key.digest(), "memoize hit");
            return Ok(Some(hit));
        }
        trace!(callable = invocation.target_name(), key = key.digest(), "memoize miss");
        let value = invocation.proceed()?;
        self.store.set(key, value.clone());
        Ok(Some(value))
    }
}

impl fmt::Debug for Memoize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoize")
            .field("policy", &self.store.policy())
            .field("max_size", &self.store.max_size())
            .field("key_policy", &self.policy)
            .field("key_receiver", &self.key_receiver)
            .finish()
    }
}

/// Store described by `settings`: TTL when entries expire, LRU otherwise.
pub fn default_store(settings: &CacheSettings) -> MemoStore {
    if settings.expires() {
        Arc::new(ttl_cache(settings.max_age(), Some(settings.max_size)))
    } else {
        Arc::new(lru_cache(settings.max_size))
    }
}

/// Memoizing wrapper over `store`.
pub fn memoize(store: MemoStore) -> Wrapper {
    Memoize::new(store).into_wrapper()
}

/// Memoizing wrapper over an unbounded LRU store. Use
/// [`Memoize::from_settings`] for a store shaped by the `cache` settings.
pub fn memoize_default() -> Wrapper {
    memoize(Arc::new(lru_cache(0)))
}

/// Memoizing wrapper over a TTL store.
pub fn memoize_for(max_age: Duration, max_size: Option<usize>) -> Wrapper {
    memoize(Arc::new(ttl_cache(max_age, max_size)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use hookwrap_cache::{EvictionPolicy, fifo_cache};
    use hookwrap_core::{CallArgs, Error};

    use super::*;
    use crate::aggregate::Aggregate;
    use crate::callable::{Callable, Target, callable};

    fn counted(name: &str, calls: &Arc<AtomicUsize>) -> Target {
        let calls = Arc::clone(calls);
        callable(name.to_string(), move |call: CallArgs| {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            let n = call.get(0).and_then(Value::as_int).unwrap_or(0);
            Ok(Value::Int(n * n))
        })
    }

    #[test]
    fn hit_skips_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store: MemoStore = Arc::new(lru_cache(0));
        let square = memoize(Arc::clone(&store)).wrap(counted("square", &calls));
        assert_eq!(square.call(CallArgs::positional([3])).unwrap(), Value::Int(9));
        assert_eq!(square.call(CallArgs::positional([3])).unwrap(), Value::Int(9));
        assert_eq!(square.call(CallArgs::positional([4])).unwrap(), Value::Int(16));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn named_args_are_part_of_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let square = memoize(Arc::new(lru_cache(0))).wrap(counted("square", &calls));
        let _ = square.call(CallArgs::positional([2]).kwarg("mode", "a")).unwrap();
        let _ = square.call(CallArgs::positional([2]).kwarg("mode", "b")).unwrap();
        let _ = square.call(CallArgs::positional([2]).kwarg("mode", "a")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_store_scopes_by_target_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store: MemoStore = Arc::new(lru_cache(0));
        let wrapper = memoize(Arc::clone(&store));
        let a = wrapper.wrap(counted("a", &calls));
        let b = wrapper.wrap(counted("b", &calls));
        let _ = a.call(CallArgs::positional([1])).unwrap();
        let _ = b.call(CallArgs::positional([1])).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unhashable_argument_fails_before_target_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let square = memoize(Arc::new(lru_cache(0))).wrap(counted("square", &calls));
        let err = square
            .call(CallArgs::positional([Value::List(vec![Value::Int(1)])]))
            .unwrap_err();
        assert_matches!(err, Error::UnhashableKey { kind: "list", .. });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn structural_policy_accepts_lists() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = Memoize::new(Arc::new(lru_cache(0)))
            .key_policy(KeyPolicy::Structural)
            .into_wrapper();
        let f = wrapper.wrap(counted("f", &calls));
        let arg = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let _ = f.call(CallArgs::positional([arg.clone()])).unwrap();
        let _ = f.call(CallArgs::positional([arg])).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn target_errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let store: MemoStore = Arc::new(fifo_cache(0));
        let flaky = memoize(Arc::clone(&store)).wrap(callable("flaky", move |_| {
            let _ = seen.fetch_add(1, Ordering::SeqCst);
            Err(Error::message("nope"))
        }));
        assert!(flaky.call(CallArgs::new()).is_err());
        assert!(flaky.call(CallArgs::new()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn bounded_store_evicts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let square = memoize(Arc::new(lru_cache(1))).wrap(counted("square", &calls));
        let _ = square.call(CallArgs::positional([1])).unwrap();
        let _ = square.call(CallArgs::positional([2])).unwrap();
        let _ = square.call(CallArgs::positional([1])).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn memoize_default_is_unbounded_lru() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = memoize_default();
        assert!(wrapper.wrap_options().apply_to_members);
        let square = wrapper.wrap(counted("square", &calls));
        for round in 0..2 {
            for n in 0..50 {
                let _ = square.call(CallArgs::positional([n])).unwrap();
            }
            assert_eq!(calls.load(Ordering::SeqCst), 50, "round {round}");
        }
    }

    fn counter() -> Arc<Aggregate> {
        Aggregate::builder("Counter")
            .initializer(|inst, call| {
                let _ = inst.set("count", call.get(0).cloned().unwrap_or(Value::Int(0)));
                Ok(())
            })
            .method("peek", |inst, call| {
                let by = call.get(0).and_then(Value::as_int).unwrap_or(0);
                let count = inst.get("count").and_then(|v| v.as_int()).unwrap_or(0);
                Ok(Value::Int(count + by))
            })
            .build()
    }

    #[test]
    fn receiver_is_shared_across_instances_by_default() {
        let store: MemoStore = Arc::new(lru_cache(0));
        let agg = memoize(Arc::clone(&store)).wrap_aggregate(&counter());
        let zero = agg.instantiate(CallArgs::positional([0])).unwrap();
        let ten = agg.instantiate(CallArgs::positional([10])).unwrap();
        assert_eq!(zero.call("peek", CallArgs::positional([1])).unwrap(), Value::Int(1));
        assert_eq!(ten.call("peek", CallArgs::positional([1])).unwrap(), Value::Int(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn key_receiver_separates_instances() {
        let store: MemoStore = Arc::new(lru_cache(0));
        let agg = Memoize::new(Arc::clone(&store))
            .key_receiver(true)
            .into_wrapper()
            .wrap_aggregate(&counter());
        let zero = agg.instantiate(CallArgs::positional([0])).unwrap();
        let ten = agg.instantiate(CallArgs::positional([10])).unwrap();
        assert_eq!(zero.call("peek", CallArgs::positional([1])).unwrap(), Value::Int(1));
        assert_eq!(ten.call("peek", CallArgs::positional([1])).unwrap(), Value::Int(11));
        assert_eq!(zero.call("peek", CallArgs::positional([1])).unwrap(), Value::Int(1));
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn default_store_follows_settings() {
        let lru = default_store(&CacheSettings::default());
        assert_eq!(lru.policy(), EvictionPolicy::Lru);
        assert_eq!(lru.max_size(), 0);
        let ttl = default_store(&CacheSettings {
            max_size: 5,
            max_age_secs: 30,
        });
        assert_eq!(ttl.policy(), EvictionPolicy::Ttl);
        assert_eq!(ttl.max_size(), 5);
    }
}
