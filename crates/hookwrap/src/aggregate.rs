//! Class-like aggregates: named members, plain attributes, and a
//! construction entry point.
//!
//! An [`Aggregate`] is immutable once built. Wrapping one produces a new
//! aggregate with the same name, doc, and attributes whose members (or
//! constructor) are wrapped. Instances keep a handle to the aggregate that
//! built them, so calls on an instance of a wrapped aggregate go through
//! the wrapped members.
//!
//! Receivers travel as [`Value::Object`]: an instance member gets the
//! instance, a type member gets the aggregate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hookwrap_core::{CallArgs, Error, Object, Result, Value};
use parking_lot::Mutex;

use crate::callable::{Callable, CallableKind, FnCallable, Target};

/// How a member receives its implicit receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Receives the instance.
    Instance,
    /// Receives the aggregate.
    Type,
    /// Receives nothing.
    Static,
}

impl MemberKind {
    /// Matching invoker convention.
    #[must_use]
    pub fn callable_kind(self) -> CallableKind {
        match self {
            Self::Instance => CallableKind::InstanceMember,
            Self::Type => CallableKind::TypeMember,
            Self::Static => CallableKind::StaticMember,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "instance"),
            Self::Type => write!(f, "type"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// A named callable member.
#[derive(Clone)]
pub struct Member {
    name: String,
    kind: MemberKind,
    callable: Target,
}

impl Member {
    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver convention.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The callable, expecting the receiver in position 0 for instance and
    /// type members.
    pub fn callable(&self) -> &Target {
        &self.callable
    }

    pub(crate) fn with_callable(&self, callable: Target) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            callable,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

type InitFn = dyn Fn(&Instance, CallArgs) -> Result<()> + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// A class-like construct.
pub struct Aggregate {
    name: String,
    doc: Option<String>,
    attributes: BTreeMap<String, Value>,
    members: BTreeMap<String, Member>,
    initializer: Option<Arc<InitFn>>,
    constructor: Target,
}

impl Aggregate {
    /// Start building an aggregate called `name`.
    pub fn builder(name: impl Into<String>) -> AggregateBuilder {
        AggregateBuilder::new(name)
    }

    /// Aggregate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Non-callable attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// All non-callable attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Member `name`.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Members in name order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// The construction entry point. Expects the aggregate as receiver.
    pub fn constructor(&self) -> &Target {
        &self.constructor
    }

    /// This aggregate as a receiver value.
    pub fn as_value(self: &Arc<Self>) -> Value {
        Value::Object(Object::from_arc(Arc::clone(self)))
    }

    /// Build an instance through the construction entry point.
    ///
    /// Normally yields an [`Instance`] object. A wrapped constructor may
    /// return something else entirely.
    pub fn construct(self: &Arc<Self>, args: CallArgs) -> Result<Value> {
        let mut call = args;
        call.prepend(self.as_value());
        self.constructor.call(call)
    }

    /// [`construct`](Self::construct), requiring an [`Instance`] back.
    pub fn instantiate(self: &Arc<Self>, args: CallArgs) -> Result<Arc<Instance>> {
        let value = self.construct(args)?;
        value.downcast::<Instance>().ok_or_else(|| {
            Error::invalid_hook(
                format!("{}.constructor", self.name),
                format!("expected an instance, got {}", value.kind_name()),
            )
        })
    }

    /// Call member `name` through the aggregate.
    ///
    /// Type members receive this aggregate, static members nothing, and
    /// instance members expect the instance as the first argument.
    pub fn call(self: &Arc<Self>, name: &str, args: CallArgs) -> Result<Value> {
        let member = self.lookup(name)?;
        let mut call = args;
        if member.kind == MemberKind::Type {
            call.prepend(self.as_value());
        }
        member.callable.call(call)
    }

    fn lookup(&self, name: &str) -> Result<&Member> {
        self.members.get(name).ok_or_else(|| Error::UnknownMember {
            aggregate: self.name.clone(),
            member: name.to_string(),
        })
    }

    fn create_instance(self: &Arc<Self>, args: CallArgs) -> Result<Value> {
        let instance = Instance {
            aggregate: Arc::clone(self),
            fields: Mutex::new(BTreeMap::new()),
        };
        if let Some(init) = &self.initializer {
            init(&instance, args)?;
        }
        Ok(Value::Object(Object::new(instance)))
    }

    pub(crate) fn rebuild(
        &self,
        members: BTreeMap<String, Member>,
        constructor: Option<Target>,
    ) -> Self {
        Self {
            name: self.name.clone(),
            doc: self.doc.clone(),
            attributes: self.attributes.clone(),
            members,
            initializer: self.initializer.clone(),
            constructor: constructor.unwrap_or_else(|| Arc::clone(&self.constructor)),
        }
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("attributes", &self.attributes)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Default construction entry point.
struct Instantiate {
    name: String,
}

impl Callable for Instantiate {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, mut args: CallArgs) -> Result<Value> {
        let aggregate = take_receiver::<Aggregate>(&self.name, &mut args)?;
        aggregate.create_instance(args)
    }
}

fn take_receiver<T: std::any::Any + Send + Sync>(
    member: &str,
    call: &mut CallArgs,
) -> Result<Arc<T>> {
    let receiver = if call.args.is_empty() {
        None
    } else {
        call.args.remove(0).downcast::<T>()
    };
    receiver.ok_or_else(|| Error::MissingReceiver {
        member: member.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

/// An object built by an [`Aggregate`], with its own field store.
pub struct Instance {
    aggregate: Arc<Aggregate>,
    fields: Mutex<BTreeMap<String, Value>>,
}

impl Instance {
    /// The aggregate that built this instance.
    pub fn aggregate(&self) -> &Arc<Aggregate> {
        &self.aggregate
    }

    /// Field `name`, falling back to the aggregate attribute of that name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .lock()
            .get(name)
            .cloned()
            .or_else(|| self.aggregate.attribute(name).cloned())
    }

    /// Set field `name`, returning its previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.lock().insert(name.into(), value.into())
    }

    /// Replace field `name` with `f(current)` atomically.
    ///
    /// `f` runs with the field store locked and must not call back into this
    /// instance's fields; that deadlocks. Use
    /// [`update_fields`](Self::update_fields) to read other fields in the same
    /// step.
    pub fn update<F>(&self, name: impl Into<String>, f: F) -> Value
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let name = name.into();
        let mut fields = self.fields.lock();
        let next = f(fields.get(&name));
        let _ = fields.insert(name, next.clone());
        next
    }

    /// Run `f` on every field with the store locked, returning its result.
    /// Aggregate attributes are not included.
    pub fn update_fields<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BTreeMap<String, Value>) -> R,
    {
        f(&mut self.fields.lock())
    }

        /// This instance as a receiver value.
    pub fn as_value(self: &Arc<Self>) -> Value {
        Value::Object(Object::from_arc(Arc::clone(self)))
    }

    /// Call member `name` with the implicit receiver supplied.
    pub fn call(self: &Arc<Self>, name: &str, args: CallArgs) -> Result<Value> {
        let member = self.aggregate.lookup(name)?;
        let mut call = args;
        match member.kind {
            MemberKind::Instance => call.prepend(self.as_value()),
            MemberKind::Type => call.prepend(self.aggregate.as_value()),
            MemberKind::Static => {}
        }
        member.callable.call(call)
    }

    /// Member `name` bound to this instance, callable without a receiver.
    pub fn bound(self: &Arc<Self>, name: &str) -> Result<Target> {
        let member = self.aggregate.lookup(name)?;
        let receiver = match member.kind {
            MemberKind::Instance => Some(self.as_value()),
            MemberKind::Type => Some(self.aggregate.as_value()),
            MemberKind::Static => None,
        };
        Ok(Arc::new(BoundMember {
            receiver,
            callable: Arc::clone(&member.callable),
        }))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("aggregate", &self.aggregate.name)
            .field("fields", &*self.fields.lock())
            .finish()
    }
}

struct BoundMember {
    receiver: Option<Value>,
    callable: Target,
}

impl Callable for BoundMember {
    fn name(&self) -> &str {
        self.callable.name()
    }

    fn doc(&self) -> Option<&str> {
        self.callable.doc()
    }

    fn call(&self, mut args: CallArgs) -> Result<Value> {
        if let Some(receiver) = &self.receiver {
            args.prepend(receiver.clone());
        }
        self.callable.call(args)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Aggregate`].
pub struct AggregateBuilder {
    name: String,
    doc: Option<String>,
    attributes: BTreeMap<String, Value>,
    members: BTreeMap<String, Member>,
    initializer: Option<Arc<InitFn>>,
}

impl AggregateBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            attributes: BTreeMap::new(),
            members: BTreeMap::new(),
            initializer: None,
        }
    }

    /// Documentation.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Non-callable attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Runs on every new instance with the constructor arguments.
    #[must_use]
    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance, CallArgs) -> Result<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(f));
        self
    }

    /// Member from a raw callable. Instance and type members receive their
    /// receiver in position 0.
    #[must_use]
    pub fn member(mut self, kind: MemberKind, callable: Target) -> Self {
        let name = callable.name().to_string();
        let _ = self.members.insert(name.clone(), Member { name, kind, callable });
        self
    }

    /// Instance member.
    #[must_use]
    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let callable = FnCallable::new(name, move |mut call: CallArgs| {
            let instance = take_receiver::<Instance>(&member, &mut call)?;
            f(instance.as_ref(), call)
        });
        self.member(MemberKind::Instance, Arc::new(callable))
    }

    /// Type member.
    #[must_use]
    pub fn type_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Arc<Aggregate>, CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let callable = FnCallable::new(name, move |mut call: CallArgs| {
            let aggregate = take_receiver::<Aggregate>(&member, &mut call)?;
            f(&aggregate, call)
        });
        self.member(MemberKind::Type, Arc::new(callable))
    }

    /// Static member.
    #[must_use]
    pub fn static_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        self.member(MemberKind::Static, Arc::new(FnCallable::new(name, f)))
    }

    /// Finish.
    pub fn build(self) -> Arc<Aggregate> {
        let constructor: Target = Arc::new(Instantiate {
            name: self.name.clone(),
        });
        Arc::new(Aggregate {
            name: self.name,
            doc: self.doc,
            attributes: self.attributes,
            members: self.members,
            initializer: self.initializer,
            constructor,
        })
    }
}
