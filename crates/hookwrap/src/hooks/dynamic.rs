//! Hooks written against a single [`Value`] return.
//!
//! Useful when hooks come from a scripting layer or configuration rather
//! than Rust closures with typed returns. `Null` is the sentinel in every
//! role. A before hook may also return `[args, kwargs]`, a two-element list
//! holding a list and a map; any other shape fails the call with
//! [`Error::InvalidHookSignature`].

use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Error, Result, Value};

use super::{AfterHook, BeforeHook, InsteadHook};
use crate::extras::Extras;
use crate::invocation::Invocation;

type DynMutFn = dyn Fn(&mut Invocation, &Extras) -> Result<Value> + Send + Sync;
type DynRefFn = dyn Fn(&Invocation, &Extras) -> Result<Value> + Send + Sync;

/// Interpret a before hook's return value.
pub fn substitution_from_value(hook: &str, value: Value) -> Result<Option<CallArgs>> {
    let items = match value {
        Value::Null => return Ok(None),
        Value::List(items) => items,
        other => {
            return Err(Error::invalid_hook(
                hook,
                format!("expected null or [args, kwargs], got {}", other.kind_name()),
            ));
        }
    };
    let [args, kwargs]: [Value; 2] = items.try_into().map_err(|items: Vec<Value>| {
        Error::invalid_hook(
            hook,
            format!("expected [args, kwargs], got a list of {}", items.len()),
        )
    })?;
    match (args, kwargs) {
        (Value::List(args), Value::Map(kwargs)) => Ok(Some(CallArgs { args, kwargs })),
        (args, kwargs) => Err(Error::invalid_hook(
            hook,
            format!(
                "expected [list, map], got [{}, {}]",
                args.kind_name(),
                kwargs.kind_name()
            ),
        )),
    }
}

fn sentinel(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

/// Before hook returning a [`Value`].
pub struct DynamicBefore {
    name: String,
    func: Box<DynMutFn>,
}

impl BeforeHook for DynamicBefore {
    fn before(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<CallArgs>> {
        let value = (self.func)(invocation, extras)?;
        substitution_from_value(&self.name, value)
    }
}

/// After hook returning a [`Value`].
pub struct DynamicAfter {
    name: String,
    func: Box<DynRefFn>,
}

impl AfterHook for DynamicAfter {
    fn after(&self, invocation: &Invocation, extras: &Extras) -> Result<Option<Value>> {
        (self.func)(invocation, extras).map(sentinel)
    }
}

/// Instead hook returning a [`Value`].
pub struct DynamicInstead {
    name: String,
    func: Box<DynMutFn>,
}

impl InsteadHook for DynamicInstead {
    fn instead(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<Value>> {
        (self.func)(invocation, extras).map(sentinel)
    }
}

macro_rules! impl_debug {
    ($($ty:ident),*) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("name", &self.name)
                    .finish_non_exhaustive()
            }
        }
    )*};
}

impl_debug!(DynamicBefore, DynamicAfter, DynamicInstead);

/// Dynamic before hook. `name` appears in signature errors.
pub fn dynamic_before<F>(name: impl Into<String>, f: F) -> Arc<dyn BeforeHook>
where
    F: Fn(&mut Invocation, &Extras) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(DynamicBefore {
        name: name.into(),
        func: Box::new(f),
    })
}

/// Dynamic after hook.
pub fn dynamic_after<F>(name: impl Into<String>, f: F) -> Arc<dyn AfterHook>
where
    F: Fn(&Invocation, &Extras) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(DynamicAfter {
        name: name.into(),
        func: Box::new(f),
    })
}

/// Dynamic instead hook.
pub fn dynamic_instead<F>(name: impl Into<String>, f: F) -> Arc<dyn InsteadHook>
where
    F: Fn(&mut Invocation, &Extras) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(DynamicInstead {
        name: name.into(),
        func: Box::new(f),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn null_is_no_change() {
        assert!(substitution_from_value("h", Value::Null).unwrap().is_none());
    }

    #[test]
    fn pair_becomes_call_args() {
        let mut kwargs = BTreeMap::new();
        let _ = kwargs.insert("k".to_string(), Value::Int(2));
        let value = Value::List(vec![Value::List(vec![Value::Int(1)]), Value::Map(kwargs)]);
        let call = substitution_from_value("h", value).unwrap().unwrap();
        assert_eq!(call, CallArgs::positional([1]).kwarg("k", 2));
    }

    #[test]
    fn scalar_is_rejected() {
        let err = substitution_from_value("pre", Value::Int(3)).unwrap_err();
        assert_matches!(err, Error::InvalidHookSignature { hook, reason } => {
            assert_eq!(hook, "pre");
            assert!(reason.contains("int"), "{reason}");
        });
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let value = Value::List(vec![Value::List(vec![])]);
        let err = substitution_from_value("pre", value).unwrap_err();
        assert_matches!(err, Error::InvalidHookSignature { reason, .. } if reason.contains("list of 1"));
    }

    #[test]
    fn swapped_pair_is_rejected() {
        let value = Value::List(vec![Value::Map(BTreeMap::new()), Value::List(vec![])]);
        assert_matches!(
            substitution_from_value("pre", value),
            Err(Error::InvalidHookSignature { .. })
        );
    }
}
