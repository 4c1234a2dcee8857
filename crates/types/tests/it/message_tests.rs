//! Wire-format tests for the message envelope.

use assert_matches::assert_matches;
use dn_types::{
    DatasetRef, ListParams, LogParams, Message, MessagePhase, MessageType, PeerId, PeerProfile,
    SearchParams, Value,
};
use serde_json::json;

#[test]
fn test_envelope_wire_field_names() {
    let msg = Message::new(MessageType::Ping, Value::Null).with_hang_up(true);
    let encoded = serde_json::to_value(&msg).unwrap();

    assert_eq!(encoded, json!({ "Type": "PING", "Phase": 0, "Payload": null, "HangUp": true }));
}

#[test]
fn test_phase_encoded_as_integer() {
    let response = Message::response(MessageType::Datasets, json!([]));
    let error = Message::error(MessageType::Datasets, "repo unavailable");

    assert_eq!(serde_json::to_value(&response).unwrap()["Phase"], json!(1));
    assert_eq!(serde_json::to_value(&error).unwrap()["Phase"], json!(2));
}

#[test]
fn test_unrecognized_tag_decodes_to_unknown() {
    let raw = r#"{"Type":"SOMETHING_NEW","Phase":0,"Payload":{"a":1},"HangUp":false}"#;
    let msg: Message = serde_json::from_str(raw).unwrap();

    assert_eq!(msg.msg_type, MessageType::Unknown);
    assert!(msg.msg_type.is_unknown());
    assert_eq!(msg.payload, json!({ "a": 1 }));
}

#[test]
fn test_missing_fields_use_defaults() {
    let msg: Message = serde_json::from_str(r#"{"Type":"NODES"}"#).unwrap();

    assert_eq!(msg.msg_type, MessageType::Nodes);
    assert_eq!(msg.phase, MessagePhase::Request);
    assert_eq!(msg.payload, Value::Null);
    assert!(!msg.hang_up);
}

#[test]
fn test_tag_strings_match_display() {
    for msg_type in MessageType::ALL {
        let encoded = serde_json::to_value(msg_type).unwrap();
        assert_eq!(encoded, Value::String(msg_type.to_string()));
    }
    assert!(!MessageType::ALL.contains(&MessageType::Unknown));
}

#[test]
fn test_typed_payload_access() {
    let params = LogParams { path: "/ipfs/QmVersion".into(), page: ListParams::new(10, 0) };
    let msg = Message::with_params(MessageType::DatasetLog, &params).unwrap();

    assert_eq!(msg.payload, json!({ "Path": "/ipfs/QmVersion", "Limit": 10, "Offset": 0 }));
    let decoded: LogParams = msg.decode_payload().unwrap();
    assert_eq!(decoded, params);

    // payload shape does not match the requested type
    assert_matches!(msg.decode_payload::<Vec<DatasetRef>>(), Err(_));
}

#[test]
fn test_search_params_default_page() {
    let params: SearchParams =
        serde_json::from_value(json!({ "Query": "climate", "Limit": 5 })).unwrap();

    assert_eq!(params.query, "climate");
    assert_eq!(params.page, ListParams::new(5, 0));
}

#[test]
fn test_error_reason() {
    let error = Message::error(MessageType::DatasetInfo, "dataset not found");
    assert!(error.is_error());
    assert_eq!(error.error_reason().as_deref(), Some("dataset not found"));

    let structured = Message { phase: MessagePhase::Error, payload: json!({ "code": 4 }), ..error };
    assert_eq!(structured.error_reason().as_deref(), Some(r#"{"code":4}"#));

    let response = Message::response(MessageType::Ping, json!("PONG"));
    assert_eq!(response.error_reason(), None);
}

#[test]
fn test_list_params_page() {
    let items: Vec<u32> = (0..10).collect();

    assert_eq!(ListParams::new(3, 0).page(&items), vec![0, 1, 2]);
    assert_eq!(ListParams::new(3, 8).page(&items), vec![8, 9]);
    assert!(ListParams::new(3, 20).page(&items).is_empty());
}

#[test]
fn test_peer_profile_serde() {
    let id = PeerId::random();
    let profile = PeerProfile {
        id,
        peername: "archivist".into(),
        addresses: vec!["/ip4/127.0.0.1/tcp/4001".parse().unwrap()],
    };

    let encoded = serde_json::to_string(&profile).unwrap();
    let decoded: PeerProfile = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, profile);
}
