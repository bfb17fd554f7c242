//! Envelope JSON vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde_json::json;

use xdm_core::protocol::envelope::{JsonRpcMessage, SerializationSettings};

fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn parse_request_min() {
    let env: JsonRpcMessage = serde_json::from_str(&load("request_min.json")).unwrap();
    assert_eq!(env.id, 1);
    assert_eq!(env.instance_id.as_deref(), Some("calc-1"));
    assert_eq!(env.method_name.as_deref(), Some("add"));
    assert_eq!(env.params, Some(vec![json!(2), json!(3)]));
    assert!(!env.is_response());
    assert!(env.serialization_settings.is_none());
}

#[test]
fn parse_request_full() {
    let env = JsonRpcMessage::from_slice(load("request_full.json").as_bytes()).unwrap();
    assert_eq!(env.instance_context, Some(json!({ "frame": "editor", "tab": 3 })));
    assert_eq!(
        env.serialization_settings,
        Some(SerializationSettings {
            include_underscore_properties: false
        })
    );
    let params = env.params.unwrap();
    assert_eq!(params[1]["__proxyFunctionId"], json!(5));
}

#[test]
fn parse_error_response() {
    let env = JsonRpcMessage::from_slice(load("response_error.json").as_bytes()).unwrap();
    assert!(env.is_response());
    assert!(env.result.is_none());
    assert_eq!(env.error.unwrap()["message"], json!("RPC method not found: nope"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = JsonRpcMessage::from_slice(load("unknown_field.json").as_bytes()).unwrap_err();
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn every_field_is_present_on_the_wire() {
    let env = JsonRpcMessage::request(9, "calc-1", None, None, vec![], "tok", None);
    let reply = JsonRpcMessage::success(&env, json!(5));
    let wire: serde_json::Value = serde_json::from_slice(&reply.to_bytes().unwrap()).unwrap();

    assert_eq!(
        wire,
        json!({
            "id": 9,
            "instanceId": null,
            "instanceContext": null,
            "methodName": null,
            "params": null,
            "result": 5,
            "error": null,
            "handshakeToken": "tok",
            "serializationSettings": null
        })
    );
}
