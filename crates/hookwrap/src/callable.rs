//! The uniform calling contract every wrappable thing satisfies.

use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Result, Value};

/// Something that can be called with [`CallArgs`].
///
/// Free functions, aggregate members, constructors, and wrapped callables
/// all implement this, so a wrap can enclose any of them, including another
/// wrap.
pub trait Callable: Send + Sync {
    /// Name used for logging and memoize key scoping.
    fn name(&self) -> &str;

    /// Optional documentation, preserved by wrapping.
    fn doc(&self) -> Option<&str> {
        None
    }

    /// Run the callable.
    fn call(&self, args: CallArgs) -> Result<Value>;
}

/// Shared reference to a callable.
pub type Target = Arc<dyn Callable>;

/// How a callable receives its arguments.
///
/// Instance and type members get an implicit receiver as the first
/// positional argument. The receiver is hidden from hooks and restored
/// before the target runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallableKind {
    /// Standalone callable, no receiver.
    #[default]
    FreeFunction,
    /// Member receiving the instance.
    InstanceMember,
    /// Member receiving the aggregate itself.
    TypeMember,
    /// Member namespaced on an aggregate but receiving no receiver.
    StaticMember,
}

impl CallableKind {
    /// Whether calls carry an implicit receiver in position 0.
    #[must_use]
    pub fn has_receiver(self) -> bool {
        matches!(self, Self::InstanceMember | Self::TypeMember)
    }
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreeFunction => write!(f, "free_function"),
            Self::InstanceMember => write!(f, "instance_member"),
            Self::TypeMember => write!(f, "type_member"),
            Self::StaticMember => write!(f, "static_member"),
        }
    }
}

type CallFn = dyn Fn(CallArgs) -> Result<Value> + Send + Sync;

/// A named closure.
pub struct FnCallable {
    name: String,
    doc: Option<String>,
    func: Box<CallFn>,
}

impl FnCallable {
    /// Name a closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            func: Box::new(func),
        }
    }

    /// Attach documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Share as a [`Target`].
    pub fn into_target(self) -> Target {
        Arc::new(self)
    }
}

impl Callable for FnCallable {
    fn name(&self) -> &str {
        &self.name
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn call(&self, args: CallArgs) -> Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for FnCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCallable")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

/// Shorthand for `FnCallable::new(name, func).into_target()`.
pub fn callable<F>(name: impl Into<String>, func: F) -> Target
where
    F: Fn(CallArgs) -> Result<Value> + Send + Sync + 'static,
{
    FnCallable::new(name, func).into_target()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_callable_runs_closure() {
        let add = callable("add", |call: CallArgs| {
            let a = call.get(0).and_then(Value::as_int).unwrap_or(0);
            let b = call.get(1).and_then(Value::as_int).unwrap_or(0);
            Ok(Value::Int(a + b))
        });
        assert_eq!(add.name(), "add");
        assert_eq!(add.call(CallArgs::positional([2, 3])).unwrap(), Value::Int(5));
    }

    #[test]
    fn doc_is_optional() {
        let plain = FnCallable::new("f", |_| Ok(Value::Null));
        assert!(plain.doc().is_none());
        let documented = FnCallable::new("f", |_| Ok(Value::Null)).with_doc("Does f.");
        assert_eq!(documented.doc(), Some("Does f."));
    }

    #[test]
    fn receiver_kinds() {
        assert!(CallableKind::InstanceMember.has_receiver());
        assert!(CallableKind::TypeMember.has_receiver());
        assert!(!CallableKind::StaticMember.has_receiver());
        assert!(!CallableKind::default().has_receiver());
        assert_eq!(CallableKind::TypeMember.to_string(), "type_member");
    }
}
