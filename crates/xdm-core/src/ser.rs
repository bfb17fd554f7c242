//! Graph serializer: live `Value` graph -> finite JSON tree.
//!
//! Rules per type group:
//! - Primitive: as-is; dates become `{ "__proxyDate": ms }`.
//! - Array: recursed; truncated to `[]` at max depth or when the array is its
//!   own ancestor (arrays never get back-references).
//! - Object / Map: a node that is its own ancestor becomes
//!   `{ "__circularReference": id }` and the ancestor gains
//!   `"__circularReferenceId": id`; at max depth the node is `{}`.
//! - Method: registered with the host, encoded as a proxy descriptor.
//! - Exception: `{ message, name: "Error", stack, toString }`.
//! - Unknown: `XdmError::UnsupportedType`.

use std::collections::HashMap;

use serde_json::{Map, Number, Value as Json};

use crate::classify::{classify, TypeGroup};
use crate::error::{Result, XdmError};
use crate::host::ProxyHost;
use crate::protocol::wire;
use crate::protocol::SerializationSettings;
use crate::value::{read, Value};
use crate::MAX_DEPTH;

/// Ancestry state for one top-level serialize call. Never shared.
struct SerializationContext {
    /// Identity of each value currently being visited (`None` for the
    /// argument list seeded by `serialize_args`).
    ancestry: Vec<Option<usize>>,
    /// Circular-reference id assigned to each ancestor's output node.
    markers: Vec<Option<u64>>,
    /// identity -> position in `ancestry`.
    index: HashMap<usize, usize>,
    next_circular_id: u64,
}

impl SerializationContext {
    fn new() -> Self {
        Self {
            ancestry: Vec::new(),
            markers: Vec::new(),
            index: HashMap::new(),
            next_circular_id: 1,
        }
    }

    fn position(&self, identity: usize) -> Option<usize> {
        self.index.get(&identity).copied()
    }

    fn push(&mut self, identity: Option<usize>) {
        if let Some(id) = identity {
            self.index.insert(id, self.ancestry.len());
        }
        self.ancestry.push(identity);
        self.markers.push(None);
    }

    /// Pop the innermost ancestor; returns its circular-reference id, if any.
    fn pop(&mut self) -> Option<u64> {
        if let Some(Some(id)) = self.ancestry.pop() {
            self.index.remove(&id);
        }
        self.markers.pop().flatten()
    }

    /// Circular-reference id of the ancestor at `pos`, minted on first use.
    fn mark(&mut self, pos: usize) -> u64 {
        let next = &mut self.next_circular_id;
        let slot = &mut self.markers[pos];
        *slot.get_or_insert_with(|| {
            let id = *next;
            *next += 1;
            id
        })
    }
}

/// Encodes values for one channel.
pub struct GraphSerializer<'h> {
    host: &'h dyn ProxyHost,
    max_depth: usize,
    include_underscore_properties: bool,
}

impl<'h> GraphSerializer<'h> {
    pub fn new(host: &'h dyn ProxyHost) -> Self {
        Self {
            host,
            max_depth: MAX_DEPTH,
            include_underscore_properties: true,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_settings(mut self, settings: Option<&SerializationSettings>) -> Self {
        if let Some(s) = settings {
            self.include_underscore_properties = s.include_underscore_properties;
        }
        self
    }

    /// Serialize one value. The value sits at depth 1.
    pub fn serialize(&self, value: &Value) -> Result<Json> {
        let mut ctx = SerializationContext::new();
        self.encode(value, &mut ctx, 1)
    }

    /// Serialize a positional argument list.
    ///
    /// The list itself is depth 1 and is seeded into the ancestry, so each
    /// argument starts at depth 2.
    pub fn serialize_args(&self, args: &[Value]) -> Result<Vec<Json>> {
        let mut ctx = SerializationContext::new();
        ctx.push(None);
        args.iter()
            .map(|arg| self.encode(arg, &mut ctx, 2))
            .collect()
    }

    fn encode(&self, value: &Value, ctx: &mut SerializationContext, depth: usize) -> Result<Json> {
        if value.is_null() {
            return Ok(Json::Null);
        }

        match (classify(value), value) {
            (TypeGroup::Primitive, v) => Ok(encode_primitive(v)),
            (TypeGroup::Array, Value::Array(items)) => {
                let identity = value.identity();
                let is_ancestor = identity.is_some_and(|id| ctx.position(id).is_some());
                if depth >= self.max_depth || is_ancestor {
                    tracing::trace!(depth, is_ancestor, "array truncated");
                    return Ok(Json::Array(Vec::new()));
                }

                let snapshot = read(items).clone();
                ctx.push(identity);
                let out = snapshot
                    .iter()
                    .map(|el| self.encode(el, ctx, depth + 1))
                    .collect::<Result<Vec<_>>>();
                ctx.pop();
                Ok(Json::Array(out?))
            }
            (TypeGroup::Map, Value::Map(entries)) => {
                self.encode_members(value, ctx, depth, false, || {
                    read(entries)
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
            }
            (TypeGroup::Object, Value::Object(obj)) => {
                self.encode_members(value, ctx, depth, true, || obj.members())
            }
            (TypeGroup::Method, Value::Method(method)) => {
                let proxy_id = self.host.register_proxy_function(method.clone());
                Ok(wire::function_node(proxy_id, self.host.channel_id()))
            }
            (TypeGroup::Exception, Value::Object(obj)) => obj
                .as_exception()
                .map(|e| wire::error_node(&e))
                .ok_or_else(|| XdmError::Internal("exception without payload".into())),
            _ => Err(XdmError::UnsupportedType(value.type_name())),
        }
    }

    fn encode_members(
        &self,
        value: &Value,
        ctx: &mut SerializationContext,
        depth: usize,
        filter_underscore: bool,
        members: impl FnOnce() -> Vec<(String, Value)>,
    ) -> Result<Json> {
        let identity = value.identity();
        if let Some(pos) = identity.and_then(|id| ctx.position(id)) {
            let id = ctx.mark(pos);
            return Ok(wire::circular_reference_node(id));
        }

        if depth >= self.max_depth {
            tracing::trace!(depth, "object truncated");
            return Ok(Json::Object(Map::new()));
        }

        let skip_underscore = filter_underscore && !self.include_underscore_properties;
        ctx.push(identity);
        let out = members()
            .into_iter()
            .filter(|(name, _)| !(skip_underscore && name.starts_with('_')))
            .map(|(name, member)| self.encode(&member, ctx, depth + 1).map(|node| (name, node)))
            .collect::<Result<Map<String, Json>>>();
        let marker = ctx.pop();

        let mut node = out?;
        if let Some(id) = marker {
            node.insert(wire::CIRCULAR_REFERENCE_ID.into(), id.into());
        }
        Ok(Json::Object(node))
    }
}

fn encode_primitive(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        // Non-finite floats have no JSON form.
        Value::Float(x) => Number::from_f64(*x).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => wire::date_node(d.timestamp_millis()),
        _ => Json::Null,
    }
}
