//! Special wire node shapes.
//!
//! ```text
//! date              { "__proxyDate": <i64 ms since epoch> }
//! function          { "__proxyFunctionId": <int>, "__channelId": <int> }
//! back-edge         { "__circularReference": <int> }
//! cycle target      { ..., "__circularReferenceId": <int> }
//! error             { "message", "name": "Error", "stack", "toString" }
//! ```

use serde_json::{json, Map, Value as Json};

use crate::value::ErrorValue;

pub const PROXY_DATE: &str = "__proxyDate";
pub const PROXY_FUNCTION_ID: &str = "__proxyFunctionId";
pub const CHANNEL_ID: &str = "__channelId";
pub const CIRCULAR_REFERENCE: &str = "__circularReference";
pub const CIRCULAR_REFERENCE_ID: &str = "__circularReferenceId";

/// `name` field value of every encoded error.
pub const ERROR_NAME: &str = "Error";

/// Instance id prefix addressing a registered proxy function.
pub const PROXY_INSTANCE_PREFIX: &str = "proxy";

pub fn date_node(millis: i64) -> Json {
    json!({ PROXY_DATE: millis })
}

pub fn function_node(proxy_id: u64, channel_id: u64) -> Json {
    json!({ PROXY_FUNCTION_ID: proxy_id, CHANNEL_ID: channel_id })
}

pub fn circular_reference_node(id: u64) -> Json {
    json!({ CIRCULAR_REFERENCE: id })
}

pub fn error_node(err: &ErrorValue) -> Json {
    json!({
        "message": err.message,
        "name": ERROR_NAME,
        "stack": err.stack,
        "toString": err.to_string(),
    })
}

/// Instance id under which proxy function `proxy_id` is addressed.
pub fn proxy_instance_id(proxy_id: u64) -> String {
    format!("{PROXY_INSTANCE_PREFIX}{proxy_id}")
}

/// Inverse of [`proxy_instance_id`].
pub fn parse_proxy_instance_id(instance_id: &str) -> Option<u64> {
    instance_id
        .strip_prefix(PROXY_INSTANCE_PREFIX)
        .and_then(|n| n.parse().ok())
}

/// A recognized special node.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialNode {
    Date(i64),
    Function { proxy_id: u64, channel_id: u64 },
    CircularReference(u64),
    Error(ErrorValue),
}

/// Match a JSON object against the special shapes.
///
/// Shapes match on their exact key set so ordinary objects that merely carry
/// one of these names are left alone.
pub fn match_special(obj: &Map<String, Json>) -> Option<SpecialNode> {
    match obj.len() {
        1 => {
            if let Some(ms) = obj.get(PROXY_DATE).and_then(Json::as_i64) {
                return Some(SpecialNode::Date(ms));
            }
            obj.get(CIRCULAR_REFERENCE)
                .and_then(Json::as_u64)
                .map(SpecialNode::CircularReference)
        }
        2 => {
            let proxy_id = obj.get(PROXY_FUNCTION_ID).and_then(Json::as_u64)?;
            let channel_id = obj.get(CHANNEL_ID).and_then(Json::as_u64)?;
            Some(SpecialNode::Function {
                proxy_id,
                channel_id,
            })
        }
        4 => {
            if obj.get("name").and_then(Json::as_str) != Some(ERROR_NAME) || !obj.contains_key("toString") {
                return None;
            }
            let message = obj.get("message").and_then(Json::as_str)?.to_owned();
            let stack = match obj.get("stack") {
                Some(Json::String(s)) => Some(s.clone()),
                Some(Json::Null) => None,
                _ => return None,
            };
            Some(SpecialNode::Error(ErrorValue { message, stack }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(v: Json) -> Map<String, Json> {
        match v {
            Json::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn shapes_are_recognized() {
        assert_eq!(match_special(&obj(date_node(42))), Some(SpecialNode::Date(42)));
        assert_eq!(
            match_special(&obj(function_node(3, 9))),
            Some(SpecialNode::Function { proxy_id: 3, channel_id: 9 })
        );
        assert_eq!(
            match_special(&obj(circular_reference_node(1))),
            Some(SpecialNode::CircularReference(1))
        );
        let e = ErrorValue::new("nope");
        assert_eq!(match_special(&obj(error_node(&e))), Some(SpecialNode::Error(e)));
    }

    #[test]
    fn lookalikes_are_plain_objects() {
        assert_eq!(match_special(&obj(json!({ "__proxyDate": "soon" }))), None);
        assert_eq!(match_special(&obj(json!({ "__proxyDate": 1, "x": 2 }))), None);
        assert_eq!(
            match_special(&obj(json!({ "message": "m", "name": "Other", "stack": null, "toString": "" }))),
            None
        );
    }

    #[test]
    fn proxy_instance_ids() {
        assert_eq!(proxy_instance_id(7), "proxy7");
        assert_eq!(parse_proxy_instance_id("proxy7"), Some(7));
        assert_eq!(parse_proxy_instance_id("calc-1"), None);
    }
}
