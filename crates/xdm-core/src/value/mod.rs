//! Live value model.
//!
//! A `Value` is one node of an arbitrary object graph as seen by the local
//! execution context. Compound nodes (`Array`, `Map`, `Object`) are shared
//! handles, so a graph may contain the same node more than once and may be
//! cyclic. Node identity is the address of the shared allocation.
//!
//! Note: cycles built out of `Arc` handles are never freed. That is accepted
//! for the short-lived graphs this crate ships across a channel.

mod method;
mod object;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

pub use method::{Invocable, Invocation, Method};
pub use object::{ErrorValue, Record, XdmObject};

/// Shared, growable sequence.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;
/// Shared keyed dictionary.
pub type MapRef = Arc<RwLock<BTreeMap<String, Value>>>;
/// Shared object exposing its members.
pub type ObjectRef = Arc<dyn XdmObject>;

/// One node of a live object graph.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(ArrayRef),
    Map(MapRef),
    Object(ObjectRef),
    Method(Method),
    /// A value of a shape this crate cannot encode (classifies as `Unknown`).
    Opaque(String),
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Arc::new(RwLock::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn object(obj: impl XdmObject + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Snapshot of an array's elements.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(a) => Some(read(a).clone()),
            _ => None,
        }
    }

    /// Member lookup on objects and maps.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.member(name),
            Value::Map(m) => read(m).get(name).cloned(),
            _ => None,
        }
    }

    /// Identity of a shared compound node; `None` for scalars and methods.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Arc::as_ptr(a) as *const () as usize),
            Value::Map(m) => Some(Arc::as_ptr(m) as *const () as usize),
            Value::Object(o) => Some(Arc::as_ptr(o) as *const () as usize),
            _ => None,
        }
    }

    /// True when both values are the same shared node.
    pub fn same_node(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Runtime type name, used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::String(_) => "string".into(),
            Value::Date(_) => "date".into(),
            Value::Array(_) => "array".into(),
            Value::Map(_) => "map".into(),
            Value::Object(o) => o.type_name().to_string(),
            Value::Method(_) => "method".into(),
            Value::Opaque(name) => name.clone(),
        }
    }
}

// Lock poisoning only means another thread panicked mid-write; the data is
// still a valid graph node.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl fmt::Debug for Value {
    // Shallow on purpose: graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Date(d) => write!(f, "Date({d})"),
            Value::Array(a) => write!(f, "Array(len={})", read(a).len()),
            Value::Map(m) => write!(f, "Map(len={})", read(m).len()),
            Value::Object(o) => write!(f, "Object({})", o.type_name()),
            Value::Method(_) => f.write_str("Method"),
            Value::Opaque(name) => write!(f, "Opaque({name})"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Method> for Value {
    fn from(m: Method) -> Self {
        Value::Method(m)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::object(e)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::object(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tracks_the_shared_node_not_its_contents() {
        let a = Value::array([Value::from(1)]);
        let b = Value::array([Value::from(1)]);
        let a2 = a.clone();

        assert!(a.same_node(&a2));
        assert!(!a.same_node(&b));
        assert!(Value::from(1).identity().is_none());
    }

    #[test]
    fn get_reads_object_members_and_map_entries() {
        let rec = Value::from(Record::new("Point").with("x", 3).with("y", 4));
        assert_eq!(rec.get("y").and_then(|v| v.as_i64()), Some(4));
        assert!(rec.get("z").is_none());

        let m = Value::map([("k", Value::from("v"))]);
        assert_eq!(m.get("k").as_ref().and_then(Value::as_str), Some("v"));
    }
}
