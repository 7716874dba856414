//! # hookwrap
//!
//! Hook-based wrapping of callables and aggregates.
//!
//! A [`Wrapper`] holds one [`HookSet`] and applies it to a target. Calls to
//! the wrapped target run the hooks in a fixed order:
//!
//! - **before** sees the arguments and may mutate them in place or return a
//!   full substitution.
//! - **instead** replaces the call. It may [`proceed`](Invocation::proceed)
//!   to the target any number of times, or not at all.
//! - **after** sees the arguments and the result and may replace the result.
//!
//! With no hooks the wrapper is transparent. Wrappers stack: the outermost
//! wrap runs its before hook first and its after hook last.
//!
//! ## Aggregates
//!
//! An [`Aggregate`] is a named bundle of instance, type, and static members
//! plus a constructor. Wrapping it either wraps every qualifying member with
//! one shared [`Extras`] handle or wraps only the constructor. Receivers are
//! hidden from hooks by the [`ParameterAdapter`].
//!
//! ## Ready-made wrappers
//!
//! - [`memoize`]: results cached in a [`hookwrap_cache`] store. Keys leave
//!   out the receiver unless [`Memoize::key_receiver`] is set, so instances
//!   with different state share entries for equal arguments.
//! - [`intercept`]: catch, handle, and optionally re-raise target errors
//! - [`log_call`]: a `tracing` event per call
//!
//! ## Example
//!
//! ```rust
//! use hookwrap::{CallArgs, Callable, Value, callable, wrap_before};
//!
//! let double = callable("double", |call: CallArgs| {
//!     Ok(Value::Int(call.get(0).and_then(Value::as_int).unwrap_or(0) * 2))
//! });
//! let plus_one = wrap_before(|inv, _| {
//!     if let Some(Value::Int(n)) = inv.args_mut().first_mut() {
//!         *n += 1;
//!     }
//!     Ok(None)
//! })
//! .wrap(double);
//! assert_eq!(plus_one.call(CallArgs::positional([2])).unwrap(), Value::Int(6));
//! ```

#![deny(unsafe_code)]

pub mod adapter;
pub mod aggregate;
pub mod callable;
pub mod extras;
pub mod hooks;
pub mod invocation;
pub mod invoker;
pub mod member;
pub mod memoize;
pub mod ready;
pub mod wrapper;

pub use adapter::ParameterAdapter;
pub use aggregate::{Aggregate, AggregateBuilder, Instance, Member, MemberKind};
pub use callable::{Callable, CallableKind, FnCallable, Target, callable};
pub use extras::Extras;
pub use hooks::dynamic::{dynamic_after, dynamic_before, dynamic_instead};
pub use hooks::{AfterHook, BeforeHook, HookSet, InsteadHook, after_fn, before_fn, instead_fn};
pub use invocation::Invocation;
pub use invoker::Wrapped;
pub use member::{MemberFilter, RESERVED_PREFIX};
pub use memoize::{MemoStore, Memoize, default_store, memoize, memoize_default, memoize_for};
pub use ready::{InterceptOptions, intercept, log_call};
pub use wrapper::{
    WrapOptions, Wrappable, Wrapper, make_wrapper, wrap_after, wrap_before, wrap_compose,
    wrap_instead,
};

pub use hookwrap_cache::{CacheStore, EvictionPolicy, fifo_cache, lru_cache, ttl_cache};
pub use hookwrap_core::{CacheKey, CallArgs, Error, KeyPolicy, Object, Result, Value};

/// Install the stock `tracing` subscriber described by the `logging`
/// settings. `RUST_LOG` still wins; later calls are no-ops.
pub fn init_logging() {
    let logging = &hookwrap_settings::get_settings().logging;
    if logging.json {
        hookwrap_core::logging::init_json_subscriber(&logging.level);
    } else {
        hookwrap_core::logging::init_subscriber(&logging.level);
    }
}
