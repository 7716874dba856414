//! Per-call record threaded through the hooks of one wrap.

use std::collections::BTreeMap;
use std::fmt;

use hookwrap_core::{CallArgs, Result, Value};

use crate::adapter::ParameterAdapter;
use crate::callable::{CallableKind, Target};

/// One call passing through a wrap.
///
/// Created when the wrapped callable is entered and dropped when it
/// returns. Holds the hook-visible arguments (receiver stripped), the
/// receiver itself, the next callable inward, and the result once the
/// target has run.
pub struct Invocation {
    target: Target,
    adapter: ParameterAdapter,
    receiver: Option<Value>,
    call: CallArgs,
    result: Option<Value>,
}

impl Invocation {
    pub(crate) fn new(
        target: Target,
        adapter: ParameterAdapter,
        receiver: Option<Value>,
        call: CallArgs,
    ) -> Self {
        Self {
            target,
            adapter,
            receiver,
            call,
            result: None,
        }
    }

    /// Positional arguments, receiver excluded.
    pub fn args(&self) -> &[Value] {
        &self.call.args
    }

    /// Mutable positional arguments. Changes are seen by later hooks and by
    /// the target.
    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.call.args
    }

    /// Named arguments.
    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.call.kwargs
    }

    /// Mutable named arguments. Changes are seen by later hooks and by the
    /// target.
    pub fn kwargs_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.call.kwargs
    }

    /// Positional and named arguments together.
    pub fn call_args(&self) -> &CallArgs {
        &self.call
    }

    /// Name of the wrapped callable.
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    /// How the wrapped callable receives arguments.
    pub fn kind(&self) -> CallableKind {
        self.adapter.kind()
    }

    /// The implicit receiver, for instance and type members.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    /// Result of the target, once it has run.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Call the wrapped callable with the current arguments.
    pub fn proceed(&mut self) -> Result<Value> {
        let call = self.call.clone();
        self.proceed_with(call)
    }

    /// Call the wrapped callable with `call` instead of the current
    /// arguments. The receiver, if any, is restored automatically.
    pub fn proceed_with(&mut self, call: CallArgs) -> Result<Value> {
        let full = self.adapter.restore(self.receiver.as_ref(), call);
        let value = self.target.call(full)?;
        self.result = Some(value.clone());
        Ok(value)
    }

    pub(crate) fn replace_args(&mut self, call: CallArgs) {
        self.call = call;
    }

    pub(crate) fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("target", &self.target.name())
            .field("kind", &self.adapter.kind())
            .field("receiver", &self.receiver)
            .field("call", &self.call)
            .field("result", &self.result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::callable::callable;

    fn echo() -> Target {
        callable("echo", |call: CallArgs| Ok(Value::List(call.args)))
    }

    #[test]
    fn proceed_captures_result() {
        let mut inv = Invocation::new(
            echo(),
            ParameterAdapter::new(CallableKind::FreeFunction),
            None,
            CallArgs::positional([1, 2]),
        );
        assert!(inv.result().is_none());
        let value = inv.proceed().unwrap();
        assert_eq!(inv.result(), Some(&value));
        assert_eq!(inv.target_name(), "echo");
    }

    #[test]
    fn proceed_restores_receiver() {
        let mut inv = Invocation::new(
            echo(),
            ParameterAdapter::new(CallableKind::InstanceMember),
            Some(Value::from("me")),
            CallArgs::positional([1]),
        );
        assert_eq!(inv.args(), &[Value::Int(1)]);
        let value = inv.proceed().unwrap();
        assert_eq!(value, Value::List(vec![Value::from("me"), Value::Int(1)]));
    }

    #[test]
    fn proceed_with_overrides_args() {
        let mut inv = Invocation::new(
            echo(),
            ParameterAdapter::new(CallableKind::FreeFunction),
            None,
            CallArgs::positional([1]),
        );
        let value = inv.proceed_with(CallArgs::positional([9])).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(9)]));
        assert_eq!(inv.args(), &[Value::Int(1)]);
    }

    #[test]
    fn mutations_reach_target() {
        let mut inv = Invocation::new(
            callable("kw", |call: CallArgs| {
                Ok(call.named("flag").cloned().unwrap_or_default())
            }),
            ParameterAdapter::new(CallableKind::FreeFunction),
            None,
            CallArgs::new(),
        );
        let _ = inv.kwargs_mut().insert("flag".into(), Value::Bool(true));
        assert_eq!(inv.proceed().unwrap(), Value::Bool(true));
    }

    #[test]
    fn failed_target_leaves_result_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut inv = Invocation::new(
            callable("boom", move |_| {
                let _ = seen.fetch_add(1, Ordering::SeqCst);
                Err(hookwrap_core::Error::message("boom"))
            }),
            ParameterAdapter::new(CallableKind::FreeFunction),
            None,
            CallArgs::new(),
        );
        assert!(inv.proceed().is_err());
        assert!(inv.result().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
