//! Structural classification of values.
//!
//! Check order is part of the contract:
//! - exception before object (an error value is structurally an object),
//! - primitive before array (a string is enumerable but is a primitive),
//! - anything unrecognized is `Unknown` and must make serialization fail.

use crate::value::Value;

/// Serialization strategy selected for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeGroup {
    Unknown,
    Primitive,
    Array,
    Map,
    Method,
    Object,
    Exception,
}

impl TypeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeGroup::Unknown => "unknown",
            TypeGroup::Primitive => "primitive",
            TypeGroup::Array => "array",
            TypeGroup::Map => "map",
            TypeGroup::Method => "method",
            TypeGroup::Object => "object",
            TypeGroup::Exception => "exception",
        }
    }
}

/// Classify a value. Pure and infallible.
pub fn classify(value: &Value) -> TypeGroup {
    if is_exception(value) {
        return TypeGroup::Exception;
    }
    match value {
        Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Date(_) => TypeGroup::Primitive,
        Value::Array(_) => TypeGroup::Array,
        Value::Map(_) => TypeGroup::Map,
        Value::Method(_) => TypeGroup::Method,
        Value::Object(_) => TypeGroup::Object,
        Value::Opaque(_) => TypeGroup::Unknown,
    }
}

fn is_exception(value: &Value) -> bool {
    matches!(value, Value::Object(o) if o.as_exception().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ErrorValue, Method, Record};

    #[test]
    fn error_objects_classify_as_exception() {
        let err = Value::from(ErrorValue::new("x"));
        assert_eq!(classify(&err), TypeGroup::Exception);

        let plain = Value::from(Record::new("Error").with("message", "x"));
        assert_eq!(classify(&plain), TypeGroup::Object);
    }

    #[test]
    fn groups() {
        assert_eq!(classify(&Value::from("abc")), TypeGroup::Primitive);
        assert_eq!(classify(&Value::from(chrono::Utc::now())), TypeGroup::Primitive);
        assert_eq!(classify(&Value::array([])), TypeGroup::Array);
        assert_eq!(classify(&Value::map::<&str>([])), TypeGroup::Map);
        assert_eq!(
            classify(&Value::from(Method::from_fn(|_| Ok(Value::Null)))),
            TypeGroup::Method
        );
        assert_eq!(classify(&Value::Opaque("Socket".into())), TypeGroup::Unknown);
    }
}
