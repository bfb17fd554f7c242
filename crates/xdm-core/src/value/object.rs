use std::fmt;
use std::sync::RwLock;

use super::{read, write, Value};

/// An object whose public members can be enumerated.
///
/// This is the explicit replacement for runtime reflection: a type lists its
/// own members in declaration order and the serializer walks that list.
pub trait XdmObject: Send + Sync {
    fn type_name(&self) -> &str;

    /// Public members in declaration order.
    fn members(&self) -> Vec<(String, Value)>;

    fn member(&self, name: &str) -> Option<Value> {
        self.members()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// `Some` when this object is an error/exception value.
    fn as_exception(&self) -> Option<ErrorValue> {
        None
    }
}

/// Dynamic object with ordered, settable fields.
///
/// Fields can be assigned after the record is shared, which is how cyclic
/// graphs are built:
///
/// ```
/// use std::sync::Arc;
/// use xdm_core::value::{Record, Value};
///
/// let node = Arc::new(Record::new("Node"));
/// node.set("child", Value::Object(node.clone()));
/// ```
pub struct Record {
    type_name: String,
    fields: RwLock<Vec<(String, Value)>>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RwLock::new(Vec::new()),
        }
    }

    /// Builder-style `set`.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Assign a field; existing fields keep their position.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let mut fields = write(&self.fields);
        match fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        read(&self.fields)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        read(&self.fields).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl XdmObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn members(&self) -> Vec<(String, Value)> {
        read(&self.fields).clone()
    }

    fn member(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}

/// Error/exception value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)?;
        if let Some(stack) = &self.stack {
            write!(f, "\n{stack}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorValue {}

impl XdmObject for ErrorValue {
    fn type_name(&self) -> &str {
        "Error"
    }

    fn members(&self) -> Vec<(String, Value)> {
        vec![
            ("message".into(), Value::String(self.message.clone())),
            ("stack".into(), self.stack.clone().into()),
        ]
    }

    fn as_exception(&self) -> Option<ErrorValue> {
        Some(self.clone())
    }
}
