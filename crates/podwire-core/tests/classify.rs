//! Command/reply classification tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use podwire_core::protocol::message::{self, Inbound, Reply};
use podwire_core::error::ClientCode;
use podwire_core::protocol::{Envelope, Method, Params};
use podwire_core::PodwireError;

fn inspect_42() -> Envelope {
    let params: Params = [("id", "42")].into_iter().collect();
    Envelope::command(Method::Get, "/containers/42").with_params(params)
}

#[test]
fn untagged_envelope_with_method_is_command() {
    let env = inspect_42();
    let payload = message::encode_command(None, &env).unwrap();
    match message::decode(&payload).unwrap() {
        Inbound::Command { id, envelope } => {
            assert_eq!(id, None);
            assert_eq!(envelope, env);
        }
        other => panic!("expected command, got {other:?}"),
    }
}

#[test]
fn empty_method_is_reply() {
    let payload = br#"{"Method":"","Uri":"/containers/list"}"#;
    match message::decode(payload).unwrap() {
        Inbound::Reply(r) => {
            assert_eq!(r.id, None);
            assert_eq!(&r.body[..], &payload[..]);
            assert!(r.error.is_none());
        }
        other => panic!("expected reply, got {other:?}"),
    }
}

#[test]
fn any_non_empty_method_is_command() {
    for verb in ["TRACE", "PURGE", "get", "CONNECT"] {
        let payload = format!(r#"{{"Method":"{verb}","Uri":"/containers/list"}}"#);
        match message::decode(payload.as_bytes()).unwrap() {
            Inbound::Command { id, envelope } => {
                assert_eq!(id, None);
                assert_eq!(envelope.method, Some(Method::Other(verb.to_string())));
                assert_eq!(envelope.uri, "/containers/list");
            }
            other => panic!("verb={verb}: expected command, got {other:?}"),
        }
    }
}

#[test]
fn backend_results_and_garbage_are_replies() {
    let cases: [&[u8]; 5] = [
        br#"[{"id":"abc","image":"alpine"}]"#,
        br#""Ok""#,
        b"null",
        b"not json at all",
        b"",
    ];
    for payload in cases {
        let got = message::decode(payload).unwrap();
        assert_eq!(got, Inbound::Reply(Reply::ok(None, payload.to_vec())), "payload={payload:?}");
    }
}

#[test]
fn tagged_command_keeps_id() {
    let env = inspect_42();
    let payload = message::encode_command(Some(7), &env).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(v["v"], 1);
    assert_eq!(v["kind"], "command");

    assert_eq!(
        message::decode(&payload).unwrap(),
        Inbound::Command { id: Some(7), envelope: env }
    );
}

#[test]
fn tagged_replies_carry_status() {
    let ok = Reply::ok(Some(3), br#"{"id":"abc"}"#.to_vec());
    let decoded = message::decode(&ok.encode().unwrap()).unwrap();
    assert_eq!(decoded, Inbound::Reply(ok));

    let err = Reply::err(Some(4), &PodwireError::NotFound("no such container: abc".into()));
    let decoded = message::decode(&err.encode().unwrap()).unwrap();
    assert_eq!(decoded, Inbound::Reply(err.clone()));

    let e = err.into_result().expect_err("must fail");
    assert_eq!(e.client_code(), ClientCode::NotFound);
}

#[test]
fn untagged_error_reply_is_null() {
    let err = Reply::err(None, &PodwireError::Backend("boom".into()));
    assert_eq!(err.encode().unwrap(), b"null");
}

#[test]
fn tagged_reply_body_must_be_json() {
    let bad = Reply::ok(Some(1), b"not json".to_vec());
    assert!(bad.encode().is_err());
}

#[test]
fn tagged_message_with_wrong_version_is_rejected() {
    let payload = br#"{"v":2,"kind":"reply","id":1,"status":"ok","body":null}"#;
    let err = message::decode(payload).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn malformed_tagged_message_is_an_error_not_a_reply() {
    let payload = br#"{"v":1,"kind":"command","id":1}"#;
    assert!(message::decode(payload).is_err());

    let payload = br#"{"v":1,"kind":"reply","id":1,"status":"ok","extra":true}"#;
    assert!(message::decode(payload).is_err());
}
