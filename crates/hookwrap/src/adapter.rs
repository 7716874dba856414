//! Receiver stripping for member calls.
//!
//! Hooks always see the arguments a caller would write, never the implicit
//! receiver. For instance and type members the adapter splits position 0
//! off before hooks run and puts it back before the target runs. Free
//! functions and static members pass through unchanged.

use hookwrap_core::{CallArgs, Error, Result, Value};

use crate::callable::CallableKind;

/// Splits and restores the implicit receiver according to a [`CallableKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterAdapter {
    kind: CallableKind,
}

impl ParameterAdapter {
    /// Adapter for callables of `kind`.
    #[must_use]
    pub fn new(kind: CallableKind) -> Self {
        Self { kind }
    }

    /// The kind this adapter branches on.
    #[must_use]
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// Separate the receiver from the hook-visible arguments.
    ///
    /// Fails with [`Error::MissingReceiver`] when a receiver-taking member is
    /// called with no positional arguments.
    pub fn strip(&self, member: &str, mut call: CallArgs) -> Result<(Option<Value>, CallArgs)> {
        if !self.kind.has_receiver() {
            return Ok((None, call));
        }
        if call.args.is_empty() {
            return Err(Error::MissingReceiver {
                member: member.to_string(),
            });
        }
        let receiver = call.args.remove(0);
        Ok((Some(receiver), call))
    }

    /// Rebuild the full argument list for the target.
    #[must_use]
    pub fn restore(&self, receiver: Option<&Value>, mut call: CallArgs) -> CallArgs {
        if let Some(receiver) = receiver {
            call.prepend(receiver.clone());
        }
        call
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn free_function_untouched() {
        let adapter = ParameterAdapter::new(CallableKind::FreeFunction);
        let (receiver, call) = adapter.strip("f", CallArgs::positional([1, 2])).unwrap();
        assert!(receiver.is_none());
        assert_eq!(call.args, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn static_member_untouched() {
        let adapter = ParameterAdapter::new(CallableKind::StaticMember);
        let (receiver, call) = adapter.strip("s", CallArgs::new()).unwrap();
        assert!(receiver.is_none());
        assert!(call.is_empty());
    }

    #[test]
    fn instance_member_strips_and_restores() {
        let adapter = ParameterAdapter::new(CallableKind::InstanceMember);
        let full = CallArgs::positional(["self", "x"]).kwarg("k", 1);
        let (receiver, call) = adapter.strip("m", full.clone()).unwrap();
        assert_eq!(receiver, Some(Value::from("self")));
        assert_eq!(call.args, vec![Value::from("x")]);
        assert_eq!(call.named("k"), Some(&Value::Int(1)));
        assert_eq!(adapter.restore(receiver.as_ref(), call), full);
    }

    #[test]
    fn type_member_without_receiver_fails() {
        let adapter = ParameterAdapter::new(CallableKind::TypeMember);
        let err = adapter.strip("build", CallArgs::new().kwarg("a", 1)).unwrap_err();
        assert_matches!(err, Error::MissingReceiver { member } if member == "build");
    }
}
