//! Graph serializer properties over larger graphs.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use xdm_core::value::{Method, Record, Value};
use xdm_core::{DetachedHost, GraphDeserializer, GraphSerializer, XdmObject};

/// A hand-written type exposing its members explicitly.
struct Invoice {
    number: i64,
    customer: String,
    lines: Vec<(String, f64)>,
}

impl XdmObject for Invoice {
    fn type_name(&self) -> &str {
        "Invoice"
    }

    fn members(&self) -> Vec<(String, Value)> {
        let lines = self
            .lines
            .iter()
            .map(|(sku, amount)| Value::from(Record::new("Line").with("sku", sku.as_str()).with("amount", *amount)));
        vec![
            ("number".into(), Value::Int(self.number)),
            ("customer".into(), Value::from(self.customer.as_str())),
            ("lines".into(), Value::array(lines)),
        ]
    }
}

#[test]
fn acyclic_graph_survives_encode_decode_encode() {
    let host = DetachedHost::new(3);
    let invoice = Value::object(Invoice {
        number: 17,
        customer: "acme".into(),
        lines: vec![("a-1".into(), 9.5), ("b-2".into(), 1.25)],
    });
    let root = Value::from(
        Record::new("Envelope")
            .with("invoice", invoice)
            .with("issued", Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
            .with("tags", Value::map([("priority", Value::from("high"))])),
    );

    let ser = GraphSerializer::new(&host);
    let first = ser.serialize(&root).unwrap();
    let decoded = GraphDeserializer::new(&host).deserialize(&first).unwrap();
    let second = ser.serialize(&decoded).unwrap();

    assert_eq!(first, second);
    assert_eq!(first["invoice"]["lines"][1], json!({ "sku": "b-2", "amount": 1.25 }));
    assert_eq!(
        decoded.get("issued").and_then(|d| d.as_date()).map(|d| d.timestamp_millis()),
        Some(1_709_208_000_000)
    );
}

#[test]
fn cycle_through_array_marks_the_object() {
    let host = DetachedHost::new(1);
    let parent = Arc::new(Record::new("Parent"));
    let children = Value::array([]);
    let child = Value::from(Record::new("Child").with("parent", Value::Object(parent.clone())));
    if let Value::Array(items) = &children {
        items.write().unwrap().push(child);
    }
    parent.set("children", children);

    let out = GraphSerializer::new(&host).serialize(&Value::Object(parent)).unwrap();
    assert_eq!(out["children"][0]["parent"], json!({ "__circularReference": 1 }));
    assert_eq!(out["__circularReferenceId"], json!(1));
}

#[test]
fn two_cycles_get_distinct_ids() {
    let host = DetachedHost::new(1);
    let a = Arc::new(Record::new("A"));
    let b = Arc::new(Record::new("B"));
    a.set("me", Value::Object(a.clone()));
    b.set("me", Value::Object(b.clone()));
    let root = Value::from(Record::new("Root").with("a", Value::Object(a)).with("b", Value::Object(b)));

    let out = GraphSerializer::new(&host).serialize(&root).unwrap();
    assert_eq!(out["a"]["__circularReferenceId"], json!(1));
    assert_eq!(out["b"]["__circularReferenceId"], json!(2));
    assert_eq!(out["b"]["me"], json!({ "__circularReference": 2 }));
}

#[tokio::test]
async fn registered_functions_stay_invocable_locally() {
    let host = DetachedHost::new(1);
    let double = Method::from_fn(|args: Vec<Value>| {
        let n = args.first().and_then(Value::as_i64).unwrap_or_default();
        Ok(Value::Int(n * 2))
    });
    let out = GraphSerializer::new(&host)
        .serialize(&Value::from(Record::new("Api").with("double", double)))
        .unwrap();

    let id = out["double"]["__proxyFunctionId"].as_u64().unwrap();
    let registered = host.proxy(id).unwrap();
    assert_eq!(registered.call(vec![Value::Int(21)]).await.unwrap().as_i64(), Some(42));
}
