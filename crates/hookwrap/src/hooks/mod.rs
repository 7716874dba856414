//! Hook traits and the [`HookSet`] bundle one wrap applies.
//!
//! Three roles, each a closed capability:
//!
//! | Role    | Runs                         | `Some(..)` means                 |
//! |---------|------------------------------|----------------------------------|
//! | before  | before the target            | call the target with these args  |
//! | instead | in place of the target       | this is the result               |
//! | after   | after the target (or instead)| this replaces the result         |
//!
//! `None` is the "no change" sentinel in every role. A hook that returns
//! `Err` aborts the call; the error reaches the caller as is.
//!
//! Plain closures implement the traits. The `*_fn` helpers exist so a
//! closure's argument types are inferred without annotations.

pub mod dynamic;

use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Result, Value};

use crate::extras::Extras;
use crate::invocation::Invocation;

/// Runs before the target.
pub trait BeforeHook: Send + Sync {
    /// Inspect or mutate the invocation. Returning `Some(args)` substitutes
    /// the arguments for the forthcoming call.
    fn before(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<CallArgs>>;
}

/// Runs after the target (or the instead hook) has produced a result.
pub trait AfterHook: Send + Sync {
    /// Inspect the invocation, whose result is set. Returning `Some(value)`
    /// replaces the result.
    fn after(&self, invocation: &Invocation, extras: &Extras) -> Result<Option<Value>>;
}

/// Runs in place of the target.
///
/// The hook decides whether to call [`Invocation::proceed`]. If it never
/// does, the target and every wrap nested inside this one are skipped.
pub trait InsteadHook: Send + Sync {
    /// Produce the result. `None` falls back to the result captured by
    /// `proceed`, or `Null` if the target was not called.
    fn instead(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<Value>>;
}

impl<F> BeforeHook for F
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<CallArgs>> + Send + Sync,
{
    fn before(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<CallArgs>> {
        self(invocation, extras)
    }
}

impl<F> AfterHook for F
where
    F: Fn(&Invocation, &Extras) -> Result<Option<Value>> + Send + Sync,
{
    fn after(&self, invocation: &Invocation, extras: &Extras) -> Result<Option<Value>> {
        self(invocation, extras)
    }
}

impl<F> InsteadHook for F
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<Value>> + Send + Sync,
{
    fn instead(&self, invocation: &mut Invocation, extras: &Extras) -> Result<Option<Value>> {
        self(invocation, extras)
    }
}

/// Box a closure as a before hook.
pub fn before_fn<F>(f: F) -> Arc<dyn BeforeHook>
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<CallArgs>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as an after hook.
pub fn after_fn<F>(f: F) -> Arc<dyn AfterHook>
where
    F: Fn(&Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as an instead hook.
pub fn instead_fn<F>(f: F) -> Arc<dyn InsteadHook>
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ─────────────────────────────────────────────────────────────────────────────
// HookSet
// ─────────────────────────────────────────────────────────────────────────────

/// Up to one hook per role.
///
/// Within one set the order is before, then instead (or the target), then
/// after. That matches stacking the instead hook innermost, the before
/// hook around it, and the after hook outermost.
#[derive(Clone, Default)]
pub struct HookSet {
    before: Option<Arc<dyn BeforeHook>>,
    after: Option<Arc<dyn AfterHook>>,
    instead: Option<Arc<dyn InsteadHook>>,
}

impl HookSet {
    /// Set with no hooks. Wrapping with it is observably a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set from optional hooks.
    #[must_use]
    pub fn from_parts(
        before: Option<Arc<dyn BeforeHook>>,
        after: Option<Arc<dyn AfterHook>>,
        instead: Option<Arc<dyn InsteadHook>>,
    ) -> Self {
        Self {
            before,
            after,
            instead,
        }
    }

    /// Set the before hook from a closure.
    #[must_use]
    pub fn before<F>(self, f: F) -> Self
    where
        F: Fn(&mut Invocation, &Extras) -> Result<Option<CallArgs>> + Send + Sync + 'static,
    {
        self.with_before(Arc::new(f))
    }

    /// Set the after hook from a closure.
    #[must_use]
    pub fn after<F>(self, f: F) -> Self
    where
        F: Fn(&Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.with_after(Arc::new(f))
    }

    /// Set the instead hook from a closure.
    #[must_use]
    pub fn instead<F>(self, f: F) -> Self
    where
        F: Fn(&mut Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.with_instead(Arc::new(f))
    }

    /// Set the before hook.
    #[must_use]
    pub fn with_before(mut self, hook: Arc<dyn BeforeHook>) -> Self {
        self.before = Some(hook);
        self
    }

    /// Set the after hook.
    #[must_use]
    pub fn with_after(mut self, hook: Arc<dyn AfterHook>) -> Self {
        self.after = Some(hook);
        self
    }

    /// Set the instead hook.
    #[must_use]
    pub fn with_instead(mut self, hook: Arc<dyn InsteadHook>) -> Self {
        self.instead = Some(hook);
        self
    }

    /// The before hook.
    pub fn before_hook(&self) -> Option<&Arc<dyn BeforeHook>> {
        self.before.as_ref()
    }

    /// The after hook.
    pub fn after_hook(&self) -> Option<&Arc<dyn AfterHook>> {
        self.after.as_ref()
    }

    /// The instead hook.
    pub fn instead_hook(&self) -> Option<&Arc<dyn InsteadHook>> {
        self.instead.as_ref()
    }

    /// Whether no role is filled.
    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none() && self.instead.is_none()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("instead", &self.instead.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set() {
        let hooks = HookSet::new();
        assert!(hooks.is_empty());
        assert!(hooks.before_hook().is_none());
        assert_eq!(
            format!("{hooks:?}"),
            "HookSet { before: false, after: false, instead: false }"
        );
    }

    #[test]
    fn builder_fills_roles() {
        let hooks = HookSet::new()
            .before(|_, _| Ok(None))
            .after(|_, _| Ok(Some(Value::Int(1))));
        assert!(!hooks.is_empty());
        assert!(hooks.before_hook().is_some());
        assert!(hooks.after_hook().is_some());
        assert!(hooks.instead_hook().is_none());
    }

    #[test]
    fn from_parts_keeps_hooks() {
        let hooks = HookSet::from_parts(None, None, Some(instead_fn(|_, _| Ok(None))));
        assert!(hooks.instead_hook().is_some());
        assert!(hooks.before_hook().is_none());
    }
}
