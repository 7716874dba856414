//! Dynamic value model shared by targets, hooks, and caches.
//!
//! Every wrapped callable speaks one calling contract: it receives a
//! [`CallArgs`] (ordered positional values plus a name-keyed mapping) and
//! returns a [`Value`]. Values that must keep their identity (aggregate
//! instances and receivers, shared state stashed in extras) travel as
//! [`Object`] handles, which compare and hash by identity.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Object
// ─────────────────────────────────────────────────────────────────────────────

/// A shared, identity-bearing handle to an arbitrary value.
///
/// Cloning an `Object` clones the handle, not the value. Two handles are
/// equal only when they point at the same allocation.
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Object {
    /// Wrap a value in a new shared handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc` without reallocating, keeping its identity.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recover a typed `Arc` if the handle holds a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Borrow the held value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether the held value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Whether both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    /// Address of the shared allocation, used as the identity hash.
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }

    /// Type name of the held value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Object {}

impl std::hash::Hash for Object {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object(<{} @ {:#x}>)", self.type_name, self.addr())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────────────

/// A dynamically-typed argument or result.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence. Mutable container: not hashable under the strict key policy.
    List(Vec<Value>),
    /// Name-keyed mapping. Mutable container: not hashable under the strict key policy.
    Map(BTreeMap<String, Value>),
    /// Identity-bearing shared handle.
    Object(Object),
}

impl Value {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The list payload, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The map payload, if any.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The object handle, if any.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Downcast an object payload to a typed `Arc`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(Object::downcast::<T>)
    }

    /// Convert to JSON. Objects render as their type name; bytes as a number array.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::from(b.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Object(obj) => serde_json::Value::String(format!("<{}>", obj.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "b{b:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CallArgs
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for one call: ordered positional values plus named values.
///
/// Named arguments live in a sorted map, so their insertion order never
/// affects equality or cache keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments, in call order.
    pub args: Vec<Value>,
    /// Named arguments.
    pub kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only.
    pub fn positional<I, V>(args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a named argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Positional argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Named argument `name`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Total number of arguments, positional and named.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len() + self.kwargs.len()
    }

    /// Whether there are no arguments at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Insert a value before the first positional argument.
    pub fn prepend(&mut self, value: Value) {
        self.args.insert(0, value);
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{arg}")?;
        }
        for (name, value) in &self.kwargs {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn object_equality_is_identity() {
        let a = Object::new(5_u32);
        let b = Object::new(5_u32);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn object_downcast_roundtrip() {
        let counter = Arc::new(AtomicUsize::new(0));
        let obj = Object::from_arc(Arc::clone(&counter));
        let back = obj.downcast::<AtomicUsize>().unwrap();
        let _ = back.fetch_add(3, Ordering::SeqCst);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(obj.downcast::<String>().is_none());
        assert!(obj.is::<AtomicUsize>());
    }

    #[test]
    fn from_arc_preserves_identity() {
        let shared = Arc::new(String::from("x"));
        let a = Object::from_arc(Arc::clone(&shared));
        let b = Object::from_arc(shared);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn object_debug_includes_type_name() {
        let obj = Object::new(1_u8);
        assert!(format!("{obj:?}").contains("u8"));
    }

    #[test]
    fn value_kind_names() {
        assert_eq!(Value::Null.kind_name(), "null");
        assert_eq!(Value::from(1).kind_name(), "int");
        assert_eq!(Value::List(vec![]).kind_name(), "list");
        assert_eq!(Value::Map(BTreeMap::new()).kind_name(), "map");
        assert_eq!(Value::from(Object::new(())).kind_name(), "object");
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(7).as_float(), Some(7.0));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::from("hi").as_int().is_none());
        assert!(Value::default().is_null());
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn json_conversion_both_ways() {
        let json = serde_json::json!({"a": [1, 2.5, "x"], "b": null});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn display_renders_nested_values() {
        let mut map = BTreeMap::new();
        let _ = map.insert("k".to_string(), Value::from(vec![Value::from(1), Value::from("s")]));
        assert_eq!(Value::Map(map).to_string(), r#"{k: [1, "s"]}"#);
    }

    #[test]
    fn call_args_builder() {
        let call = CallArgs::positional([1, 2]).arg("three").kwarg("z", 26).kwarg("a", 1);
        assert_eq!(call.len(), 5);
        assert_eq!(call.get(2), Some(&Value::from("three")));
        assert_eq!(call.named("z"), Some(&Value::from(26)));
        assert_eq!(call.to_string(), r#"(1, 2, "three", a=1, z=26)"#);
    }

    #[test]
    fn call_args_named_order_irrelevant() {
        let a = CallArgs::new().kwarg("x", 1).kwarg("y", 2);
        let b = CallArgs::new().kwarg("y", 2).kwarg("x", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn call_args_prepend() {
        let mut call = CallArgs::positional([2]);
        call.prepend(Value::from(1));
        assert_eq!(call.args, vec![Value::from(1), Value::from(2)]);
        assert!(!call.is_empty());
        assert!(CallArgs::new().is_empty());
    }
}
