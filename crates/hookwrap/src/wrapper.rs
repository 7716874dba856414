//! Reusable wrapping operations and the functions that build them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Result, Value};
use hookwrap_settings::WrappingSettings;

use crate::aggregate::Aggregate;
use crate::callable::{CallableKind, Target};
use crate::extras::Extras;
use crate::hooks::{AfterHook, BeforeHook, HookSet, InsteadHook};
use crate::invocation::Invocation;
use crate::invoker::Wrapped;
use crate::member::{self, MemberFilter};

/// Flags accepted by every wrapping operation.
#[derive(Clone, Debug)]
pub struct WrapOptions {
    /// Wrap an aggregate's members (true) or its constructor (false).
    pub apply_to_members: bool,
    /// When wrapping members, skip type and static members.
    pub instance_members_only: bool,
    /// Which members qualify for wrapping.
    pub member_filter: MemberFilter,
}

impl WrapOptions {
    /// Flags from loaded settings, with the default member filter.
    #[must_use]
    pub fn from_settings(settings: &WrappingSettings) -> Self {
        Self {
            apply_to_members: settings.apply_to_members,
            instance_members_only: settings.instance_members_only,
            member_filter: MemberFilter::default(),
        }
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            apply_to_members: true,
            instance_members_only: false,
            member_filter: MemberFilter::default(),
        }
    }
}

/// Something a [`Wrapper`] can enclose.
pub trait Wrappable: Sized {
    /// Enclose `self` with `wrapper`'s hooks and a fresh extras handle.
    fn wrap_with(self, wrapper: &Wrapper) -> Self;
}

impl Wrappable for Target {
    fn wrap_with(self, wrapper: &Wrapper) -> Self {
        wrapper.wrap(self)
    }
}

impl Wrappable for Arc<Aggregate> {
    fn wrap_with(self, wrapper: &Wrapper) -> Self {
        wrapper.wrap_aggregate(&self)
    }
}

/// A reusable wrapping operation.
///
/// Holds one hook set, a template of extras, and flags. Each application
/// gets its own extras handle seeded from the template, shared by every
/// invocation of what it wraps (every member, for an aggregate).
/// Applying the same `Wrapper` twice to one target stacks two wraps.
#[derive(Clone)]
pub struct Wrapper {
    hooks: Arc<HookSet>,
    extras: BTreeMap<String, Value>,
    options: WrapOptions,
}

impl Wrapper {
    /// Wrapper for `hooks` with default flags: members are wrapped, all
    /// kinds of them. Settings never change these implicitly; pass
    /// [`WrapOptions::from_settings`] to [`options`](Self::options) to opt in.
    #[must_use]
    pub fn new(hooks: HookSet) -> Self {
        Self {
            hooks: Arc::new(hooks),
            extras: BTreeMap::new(),
            options: WrapOptions::default(),
        }
    }

    /// Add a named extra to the template.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.extras.insert(key.into(), value.into());
        self
    }

    /// Replace all flags.
    #[must_use]
    pub fn options(mut self, options: WrapOptions) -> Self {
        self.options = options;
        self
    }

    /// Set `apply_to_members`.
    #[must_use]
    pub fn apply_to_members(mut self, apply: bool) -> Self {
        self.options.apply_to_members = apply;
        self
    }

    /// Set `instance_members_only`.
    #[must_use]
    pub fn instance_members_only(mut self, only: bool) -> Self {
        self.options.instance_members_only = only;
        self
    }

    /// Set the member filter.
    #[must_use]
    pub fn member_filter(mut self, filter: MemberFilter) -> Self {
        self.options.member_filter = filter;
        self
    }

    /// The hook set applied.
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Current flags.
    pub fn wrap_options(&self) -> &WrapOptions {
        &self.options
    }

    /// A fresh extras handle seeded from the template.
    pub fn new_extras(&self) -> Extras {
        Extras::from_map(self.extras.clone())
    }

    /// Wrap anything [`Wrappable`].
    pub fn apply<W: Wrappable>(&self, target: W) -> W {
        target.wrap_with(self)
    }

    /// Wrap a free function.
    pub fn wrap(&self, target: Target) -> Target {
        self.wrap_with_extras(target, CallableKind::FreeFunction, &self.new_extras())
    }

    /// Wrap a single callable of `kind` using a caller-owned extras handle.
    pub fn wrap_with_extras(&self, target: Target, kind: CallableKind, extras: &Extras) -> Target {
        Wrapped::new(target, kind, Arc::clone(&self.hooks), extras.clone()).into_target()
    }

    /// Wrap an aggregate per the flags.
    pub fn wrap_aggregate(&self, aggregate: &Arc<Aggregate>) -> Arc<Aggregate> {
        self.wrap_aggregate_with_extras(aggregate, &self.new_extras())
    }

    /// Wrap an aggregate using a caller-owned extras handle.
    pub fn wrap_aggregate_with_extras(
        &self,
        aggregate: &Arc<Aggregate>,
        extras: &Extras,
    ) -> Arc<Aggregate> {
        let wrapped = if self.options.apply_to_members {
            member::wrap_members(
                aggregate,
                &self.hooks,
                extras,
                &self.options.member_filter,
                self.options.instance_members_only,
            )
        } else {
            member::wrap_constructor(aggregate, &self.hooks, extras)
        };
        Arc::new(wrapped)
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("hooks", &self.hooks)
            .field("extras", &self.extras)
            .field("options", &self.options)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────────────

/// Wrapper running `hook` before the target.
pub fn wrap_before<F>(hook: F) -> Wrapper
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<CallArgs>> + Send + Sync + 'static,
{
    Wrapper::new(HookSet::new().before(hook))
}

/// Wrapper running `hook` after the target.
pub fn wrap_after<F>(hook: F) -> Wrapper
where
    F: Fn(&Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Wrapper::new(HookSet::new().after(hook))
}

/// Wrapper running `hook` in place of the target.
pub fn wrap_instead<F>(hook: F) -> Wrapper
where
    F: Fn(&mut Invocation, &Extras) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Wrapper::new(HookSet::new().instead(hook))
}

/// Wrapper from any combination of hooks. All `None` gives a transparent
/// wrapper.
pub fn wrap_compose(
    before: Option<Arc<dyn BeforeHook>>,
    after: Option<Arc<dyn AfterHook>>,
    instead: Option<Arc<dyn InsteadHook>>,
) -> Wrapper {
    Wrapper::new(HookSet::from_parts(before, after, instead))
}

/// Reusable wrapper for a prepared hook set.
pub fn make_wrapper(hooks: HookSet) -> Wrapper {
    Wrapper::new(hooks)
}
