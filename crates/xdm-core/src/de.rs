//! Graph deserializer: JSON tree -> live `Value` graph.
//!
//! Inverse of [`crate::ser`]:
//! - date nodes become `Value::Date`,
//! - proxy descriptors become callables forwarding to the remote side,
//! - `{ "__circularReference": n }` re-links to the node that carried
//!   `"__circularReferenceId": n`, restoring the cycle,
//! - error nodes become `ErrorValue`,
//! - any other object becomes a `Record` with wire member order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use crate::error::{Result, XdmError};
use crate::host::ProxyHost;
use crate::protocol::wire::{self, SpecialNode};
use crate::value::{Record, Value};
use crate::MAX_DEPTH;

/// Type name given to records rebuilt from the wire.
pub const WIRE_OBJECT_TYPE: &str = "Object";

#[derive(Default)]
struct DecodeContext {
    targets: HashMap<u64, Arc<Record>>,
}

/// Decodes wire trees received on one channel.
pub struct GraphDeserializer<'h> {
    host: &'h dyn ProxyHost,
    max_depth: usize,
}

impl<'h> GraphDeserializer<'h> {
    pub fn new(host: &'h dyn ProxyHost) -> Self {
        Self {
            host,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn deserialize(&self, wire: &Json) -> Result<Value> {
        let mut ctx = DecodeContext::default();
        self.decode(wire, &mut ctx, 1)
    }

    /// Decode a positional argument list (arguments sit at depth 2).
    pub fn deserialize_args(&self, params: &[Json]) -> Result<Vec<Value>> {
        let mut ctx = DecodeContext::default();
        params
            .iter()
            .map(|p| self.decode(p, &mut ctx, 2))
            .collect()
    }

    fn decode(&self, wire: &Json, ctx: &mut DecodeContext, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(XdmError::BadRequest(format!(
                "wire tree deeper than {}",
                self.max_depth
            )));
        }

        match wire {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => Ok(match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => {
                let out = items
                    .iter()
                    .map(|item| self.decode(item, ctx, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::array(out))
            }
            Json::Object(obj) => match wire::match_special(obj) {
                Some(special) => self.decode_special(special, ctx),
                None => self.decode_record(obj, ctx, depth),
            },
        }
    }

    fn decode_special(&self, node: SpecialNode, ctx: &DecodeContext) -> Result<Value> {
        match node {
            SpecialNode::Date(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map(Value::Date)
                .ok_or_else(|| XdmError::BadRequest(format!("date out of range: {ms}"))),
            SpecialNode::Function {
                proxy_id,
                channel_id,
            } => Ok(Value::Method(self.host.remote_function(proxy_id, channel_id))),
            SpecialNode::CircularReference(id) => ctx
                .targets
                .get(&id)
                .map(|r| Value::Object(r.clone()))
                .ok_or_else(|| {
                    XdmError::BadRequest(format!("circular reference to unknown node {id}"))
                }),
            SpecialNode::Error(e) => Ok(Value::from(e)),
        }
    }

    fn decode_record(
        &self,
        obj: &Map<String, Json>,
        ctx: &mut DecodeContext,
        depth: usize,
    ) -> Result<Value> {
        let record = Arc::new(Record::new(WIRE_OBJECT_TYPE));
        if let Some(id) = obj.get(wire::CIRCULAR_REFERENCE_ID).and_then(Json::as_u64) {
            ctx.targets.insert(id, record.clone());
        }

        for (name, member) in obj {
            if name == wire::CIRCULAR_REFERENCE_ID {
                continue;
            }
            let value = self.decode(member, ctx, depth + 1)?;
            record.set(name.clone(), value);
        }
        Ok(Value::Object(record))
    }
}
