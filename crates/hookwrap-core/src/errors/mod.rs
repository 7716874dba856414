//! Error hierarchy for hookwrap.
//!
//! Provides a single error enum built on [`thiserror`]. The core is a thin
//! pass-through: it only constructs the variants it raises itself
//! ([`Error::UnhashableKey`], [`Error::InvalidHookSignature`],
//! [`Error::MissingReceiver`], [`Error::UnknownMember`]). Anything a target
//! or hook raises travels as [`Error::Target`] and keeps its concrete type,
//! recoverable through [`Error::downcast_target_ref`].

use thiserror::Error;

use crate::value::Value;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A cache key could not be computed because an argument is not hashable.
    #[error("Unhashable {kind} value in argument '{argument}'")]
    UnhashableKey {
        /// Position or name of the offending argument.
        argument: String,
        /// Kind of the offending value.
        kind: &'static str,
    },

    /// A hook violated the invocation/extras calling contract.
    #[error("Invalid signature for hook '{hook}': {reason}")]
    InvalidHookSignature {
        /// Hook role or name.
        hook: String,
        /// What was wrong with the shape.
        reason: String,
    },

    /// An instance or type member was called without its implicit receiver.
    #[error("Member '{member}' requires a receiver but was called without one")]
    MissingReceiver {
        /// Member name.
        member: String,
    },

    /// No member of that name on the aggregate.
    #[error("Aggregate '{aggregate}' has no member '{member}'")]
    UnknownMember {
        /// Aggregate name.
        aggregate: String,
        /// Requested member name.
        member: String,
    },

    /// Error raised by a wrapped target, passed through untouched.
    #[error("{0}")]
    Target(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error raised by a target or hook body.
    pub fn target(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Target(Box::new(err))
    }

    /// Build a target error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Target(message.into())
    }

    pub(crate) fn unhashable(argument: &str, value: &Value) -> Self {
        Self::UnhashableKey {
            argument: argument.to_string(),
            kind: value.kind_name(),
        }
    }

    /// Build an [`Error::InvalidHookSignature`].
    pub fn invalid_hook(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHookSignature {
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from a target rather than from the core.
    #[must_use]
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target(_))
    }

    /// Borrow the original target error as `E`, if that is what it was.
    #[must_use]
    pub fn downcast_target_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Target(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnhashableKey { .. } => "UNHASHABLE_KEY",
            Self::InvalidHookSignature { .. } => "INVALID_HOOK_SIGNATURE",
            Self::MissingReceiver { .. } => "MISSING_RECEIVER",
            Self::UnknownMember { .. } => "UNKNOWN_MEMBER",
            Self::Target(_) => "TARGET_ERROR",
        }
    }
}

/// Result type for hookwrap operations.
pub type Result<T> = std::result::Result<T, Error>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
