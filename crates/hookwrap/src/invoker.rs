//! The hook invoker: one callable wrapped with one [`HookSet`].
//!
//! Per call:
//!
//! 1. Split off the receiver for member kinds.
//! 2. Run `before`; a returned substitution replaces the arguments.
//! 3. Run `instead` if present, otherwise the inner callable.
//! 4. Run `after` with the result set; a returned value replaces it.
//!
//! The inner callable may itself be a [`Wrapped`], so stacking falls out of
//! plain nesting: before hooks fire outer to inner, after hooks inner to
//! outer, and an instead hook that never proceeds hides every wrap below it.

use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Result, Value};
use tracing::{debug, trace};

use crate::adapter::ParameterAdapter;
use crate::callable::{Callable, CallableKind, Target};
use crate::extras::Extras;
use crate::hooks::HookSet;
use crate::invocation::Invocation;

/// A callable enclosed by a hook set.
pub struct Wrapped {
    inner: Target,
    adapter: ParameterAdapter,
    hooks: Arc<HookSet>,
    extras: Extras,
}

impl Wrapped {
    /// Enclose `inner`. `extras` is shared, not copied.
    pub fn new(inner: Target, kind: CallableKind, hooks: Arc<HookSet>, extras: Extras) -> Self {
        debug!(
            callable = inner.name(),
            %kind,
            before = hooks.before_hook().is_some(),
            instead = hooks.instead_hook().is_some(),
            after = hooks.after_hook().is_some(),
            "wrapping callable"
        );
        Self {
            inner,
            adapter: ParameterAdapter::new(kind),
            hooks,
            extras,
        }
    }

    /// The enclosed callable.
    pub fn inner(&self) -> &Target {
        &self.inner
    }

    /// Receiver convention used for hooks.
    pub fn kind(&self) -> CallableKind {
        self.adapter.kind()
    }

    /// The hooks applied.
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// The shared extras handle.
    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Share as a [`Target`].
    pub fn into_target(self) -> Target {
        Arc::new(self)
    }
}

impl Callable for Wrapped {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn doc(&self) -> Option<&str> {
        self.inner.doc()
    }

    fn call(&self, args: CallArgs) -> Result<Value> {
        let (receiver, call) = self.adapter.strip(self.inner.name(), args)?;
        trace!(callable = self.inner.name(), kind = %self.adapter.kind(), %call, "invoking");
        let mut invocation =
            Invocation::new(Arc::clone(&self.inner), self.adapter, receiver, call);

        if let Some(before) = self.hooks.before_hook() {
            if let Some(substitute) = before.before(&mut invocation, &self.extras)? {
                trace!(callable = self.inner.name(), %substitute, "arguments substituted");
                invocation.replace_args(substitute);
            }
        }

        let result = match self.hooks.instead_hook() {
            Some(instead) => match instead.instead(&mut invocation, &self.extras)? {
                Some(value) => value,
                None => invocation.result().cloned().unwrap_or_default(),
            },
            None => invocation.proceed()?,
        };
        invocation.set_result(result.clone());

        match self.hooks.after_hook() {
            Some(after) => Ok(after.after(&invocation, &self.extras)?.unwrap_or(result)),
            None => Ok(result),
        }
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("inner", &self.inner.name())
            .field("kind", &self.adapter.kind())
            .field("hooks", &self.hooks)
            .field("extras", &self.extras)
            .finish()
    }
}
