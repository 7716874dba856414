//! Applying one hook set across an aggregate.
//!
//! With `apply_to_members` every member the filter allows is wrapped with
//! the same [`HookSet`] and the same [`Extras`] handle, so state kept in
//! extras is visible from every member. Otherwise only the construction
//! entry point is wrapped. Name, doc, and attributes carry over unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::aggregate::{Aggregate, MemberKind};
use crate::callable::CallableKind;
use crate::extras::Extras;
use crate::hooks::HookSet;
use crate::invoker::Wrapped;

/// Prefix of reserved member names skipped by the default filter.
pub const RESERVED_PREFIX: &str = "__";

type Predicate = dyn Fn(&str, MemberKind) -> bool + Send + Sync;

/// Allow/deny predicate over `(member name, kind)`.
#[derive(Clone)]
pub struct MemberFilter {
    predicate: Arc<Predicate>,
}

impl MemberFilter {
    /// Filter allowing members for which `predicate` returns true.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str, MemberKind) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Allow every member, reserved names included.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::new(|_, _| true)
    }

    /// Default filter, additionally denying `names`.
    #[must_use]
    pub fn deny<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let denied: Vec<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |name, _| {
            !name.starts_with(RESERVED_PREFIX) && !denied.iter().any(|d| d == name)
        })
    }

    /// Allow only `names`.
    #[must_use]
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |name, _| allowed.iter().any(|a| a == name))
    }

    /// Whether the member qualifies.
    pub fn allows(&self, name: &str, kind: MemberKind) -> bool {
        (self.predicate)(name, kind)
    }
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self::new(|name, _| !name.starts_with(RESERVED_PREFIX))
    }
}

impl fmt::Debug for MemberFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberFilter").finish_non_exhaustive()
    }
}

/// Wrap every qualifying member of `aggregate`.
pub(crate) fn wrap_members(
    aggregate: &Aggregate,
    hooks: &Arc<HookSet>,
    extras: &Extras,
    filter: &MemberFilter,
    instance_members_only: bool,
) -> Aggregate {
    let mut members = BTreeMap::new();
    let mut wrapped = 0_usize;
    for member in aggregate.members() {
        let qualifies = filter.allows(member.name(), member.kind())
            && (!instance_members_only || member.kind() == MemberKind::Instance);
        let member = if qualifies {
            wrapped += 1;
            let invoker = Wrapped::new(
                Arc::clone(member.callable()),
                member.kind().callable_kind(),
                Arc::clone(hooks),
                extras.clone(),
            );
            member.with_callable(invoker.into_target())
        } else {
            trace!(aggregate = aggregate.name(), member = member.name(), kind = %member.kind(), "member skipped");
            member.clone()
        };
        let _ = members.insert(member.name().to_string(), member);
    }
    debug!(aggregate = aggregate.name(), wrapped, "wrapped aggregate members");
    aggregate.rebuild(members, None)
}

/// Wrap only the construction entry point of `aggregate`.
pub(crate) fn wrap_constructor(
    aggregate: &Aggregate,
    hooks: &Arc<HookSet>,
    extras: &Extras,
) -> Aggregate {
    let invoker = Wrapped::new(
        Arc::clone(aggregate.constructor()),
        CallableKind::TypeMember,
        Arc::clone(hooks),
        extras.clone(),
    );
    debug!(aggregate = aggregate.name(), "wrapped aggregate constructor");
    let members = aggregate
        .members()
        .map(|m| (m.name().to_string(), m.clone()))
        .collect();
    aggregate.rebuild(members, Some(invoker.into_target()))
}
