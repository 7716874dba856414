//! Cache key computation from call arguments.
//!
//! A [`CacheKey`] captures the fully-evaluated positional arguments plus the
//! named arguments sorted by name, scoped by the target's name. Mutable
//! containers (lists and maps) are rejected under [`KeyPolicy::Strict`] and
//! hashed by structure under [`KeyPolicy::Structural`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::errors::{Error, Result};
use crate::value::{CallArgs, Object, Value};

/// How non-hashable values are treated when computing a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Lists and maps fail with [`Error::UnhashableKey`].
    #[default]
    Strict,
    /// Lists and maps are hashed by their contents.
    Structural,
}

/// Hashable projection of a single [`Value`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// Null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float bit pattern, with `-0.0` folded into `0.0`.
    Float(u64),
    /// String.
    Str(String),
    /// Bytes.
    Bytes(Vec<u8>),
    /// Sequence contents (structural policy only).
    Seq(Vec<KeyPart>),
    /// Map contents in name order (structural policy only).
    Map(Vec<(String, KeyPart)>),
    /// Object identity.
    Object(Object),
}

/// Key identifying one call in a cache store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: String,
    args: Vec<KeyPart>,
    kwargs: Vec<(String, KeyPart)>,
}

impl CacheKey {
    /// Compute the key for `call` under `scope`.
    ///
    /// Named arguments are visited in name order, so two calls that differ
    /// only in how their named arguments were supplied share a key.
    pub fn from_call(scope: impl Into<String>, call: &CallArgs, policy: KeyPolicy) -> Result<Self> {
        let args = call
            .args
            .iter()
            .enumerate()
            .map(|(i, v)| key_part(v, policy, &i.to_string()))
            .collect::<Result<Vec<_>>>()?;
        let kwargs = call
            .kwargs
            .iter()
            .map(|(name, v)| key_part(v, policy, name).map(|part| (name.clone(), part)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            scope: scope.into(),
            args,
            kwargs,
        })
    }

    /// Scope the key was computed under (usually the target name).
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// 64-bit digest of the key, for logging and diagnostics.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn key_part(value: &Value, policy: KeyPolicy, argument: &str) -> Result<KeyPart> {
    match value {
        Value::Null => Ok(KeyPart::Null),
        Value::Bool(b) => Ok(KeyPart::Bool(*b)),
        Value::Int(i) => Ok(KeyPart::Int(*i)),
        Value::Float(f) => Ok(KeyPart::Float(float_bits(*f))),
        Value::Str(s) => Ok(KeyPart::Str(s.clone())),
        Value::Bytes(b) => Ok(KeyPart::Bytes(b.clone())),
        Value::Object(obj) => Ok(KeyPart::Object(obj.clone())),
        Value::List(items) => match policy {
            KeyPolicy::Strict => Err(Error::unhashable(argument, value)),
            KeyPolicy::Structural => items
                .iter()
                .enumerate()
                .map(|(i, item)| key_part(item, policy, &format!("{argument}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(KeyPart::Seq),
        },
        Value::Map(map) => match policy {
            KeyPolicy::Strict => Err(Error::unhashable(argument, value)),
            KeyPolicy::Structural => map
                .iter()
                .map(|(k, v)| {
                    key_part(v, policy, &format!("{argument}.{k}")).map(|part| (k.clone(), part))
                })
                .collect::<Result<Vec<_>>>()
                .map(KeyPart::Map),
        },
    }
}

fn float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0.0_f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
