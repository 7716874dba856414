//! Dynamic hooks, ready-made wrappers, and emitted diagnostics.

use std::collections::BTreeMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use hookwrap::{
    CallArgs, Callable, Error, InterceptOptions, Target, Value, callable, dynamic_after,
    dynamic_before, dynamic_instead, intercept, lru_cache, memoize, wrap_compose,
};
use hookwrap_core::logging::capture_logs;
use tracing::Level;

fn sum() -> Target {
    callable("sum", |call: CallArgs| {
        let total: i64 = call.args.iter().filter_map(Value::as_int).sum();
        let bonus = call.named("bonus").and_then(Value::as_int).unwrap_or(0);
        Ok(Value::Int(total + bonus))
    })
}

#[test]
fn dynamic_before_substitutes_args_and_kwargs() {
    let mut kwargs = BTreeMap::new();
    let _ = kwargs.insert("bonus".to_string(), Value::Int(100));
    let substitution = Value::List(vec![
        Value::List(vec![Value::Int(1), Value::Int(2)]),
        Value::Map(kwargs),
    ]);
    let before = dynamic_before("swap", move |_, _| Ok(substitution.clone()));
    let wrapped = wrap_compose(Some(before), None, None).wrap(sum());
    assert_eq!(wrapped.call(CallArgs::positional([50])).unwrap(), Value::Int(103));
}

#[test]
fn dynamic_before_rejects_bad_shapes() {
    let bad = dynamic_before("bad", |_, _| Ok(Value::Int(3)));
    let wrapped = wrap_compose(Some(bad), None, None).wrap(sum());
    assert_matches!(
        wrapped.call(CallArgs::new()),
        Err(Error::InvalidHookSignature { ref hook, .. }) if hook == "bad"
    );

    let short = dynamic_before("short", |_, _| Ok(Value::List(vec![Value::List(vec![])])));
    let wrapped = wrap_compose(Some(short), None, None).wrap(sum());
    assert_matches!(wrapped.call(CallArgs::new()), Err(Error::InvalidHookSignature { .. }));
}

#[test]
fn dynamic_null_means_no_change() {
    let after = dynamic_after("noop", |_, _| Ok(Value::Null));
    let instead = dynamic_instead("pass", |inv, _| inv.proceed().map(|_| Value::Null));
    let wrapped = wrap_compose(None, Some(after), Some(instead)).wrap(sum());
    assert_eq!(wrapped.call(CallArgs::positional([2, 3])).unwrap(), Value::Int(5));
}

#[test]
fn dynamic_after_replaces_result() {
    let after = dynamic_after("double", |inv, _| {
        Ok(Value::Int(inv.result().and_then(Value::as_int).unwrap_or(0) * 2))
    });
    let wrapped = wrap_compose(None, Some(after), None).wrap(sum());
    assert_eq!(wrapped.call(CallArgs::positional([2, 3])).unwrap(), Value::Int(10));
}

#[test]
fn intercept_over_memoize_keeps_both_behaviors() {
    let store: hookwrap::MemoStore = Arc::new(lru_cache(0));
    let fragile = callable("fragile", |call: CallArgs| match call.get(0).and_then(Value::as_int) {
        Some(n) if n >= 0 => Ok(Value::Int(n)),
        _ => Err(Error::message("negative")),
    });
    let wrapped = intercept(InterceptOptions::new())
        .wrap(memoize(Arc::clone(&store)).wrap(fragile));
    assert_eq!(wrapped.call(CallArgs::positional([4])).unwrap(), Value::Int(4));
    assert_eq!(wrapped.call(CallArgs::positional([-1])).unwrap(), Value::Null);
    assert_eq!(store.len(), 1);
}

#[test]
fn wrapping_and_calls_emit_diagnostics() {
    let (logs, _guard) = capture_logs();
    let store: hookwrap::MemoStore = Arc::new(lru_cache(0));
    let wrapped = memoize(store).wrap(sum());
    assert!(logs.has_event(Level::DEBUG, "wrapping callable"), "{:?}", logs.events());

    let _ = wrapped.call(CallArgs::positional([1])).unwrap();
    let _ = wrapped.call(CallArgs::positional([1])).unwrap();
    assert!(logs.has_event(Level::TRACE, "invoking"));
    assert!(logs.has_event(Level::TRACE, "memoize miss"));
    assert!(logs.has_event(Level::TRACE, "memoize hit"));
    assert!(!logs.events_for_target("hookwrap").is_empty());
}
