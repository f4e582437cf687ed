//! Frame payload classification: command vs reply.
//!
//! Two payload shapes travel inside frames:
//! - Tagged (v1): `{"v":1,"kind":"command"|"reply","id":N,...}`. The `kind`
//!   field decides the class and `id` correlates a reply with its command.
//!   Failed replies carry `{"code", "message"}` instead of a body.
//! - Untagged: a bare [`Envelope`] for commands and the raw backend JSON for
//!   replies. The class is inferred: an envelope with a non-empty `Method` is a
//!   command, anything else (including bytes that are not an envelope at all)
//!   is a reply.
//!
//! [`decode`] accepts both, so each frame is classified on its own.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{PodwireError, RemoteFailure, Result};
use crate::protocol::envelope::Envelope;

/// Tagged protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Correlation id carried by tagged commands and their replies.
pub type RequestId = u64;

/// A classified frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Command for the local dispatcher. `id` is `None` for untagged commands.
    Command {
        id: Option<RequestId>,
        envelope: Envelope,
    },
    /// Reply to a command this side issued earlier.
    Reply(Reply),
}

/// Reply payload handed back to the waiting caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Correlation id, `None` for untagged replies.
    pub id: Option<RequestId>,
    /// Backend result (JSON) on success; empty when `error` is set.
    pub body: Bytes,
    /// Failure reported by the remote backend. Untagged replies never set it.
    pub error: Option<RemoteFailure>,
}

impl Reply {
    pub fn ok(id: Option<RequestId>, body: impl Into<Bytes>) -> Self {
        Self {
            id,
            body: body.into(),
            error: None,
        }
    }

    pub fn err(id: Option<RequestId>, failure: impl Into<RemoteFailure>) -> Self {
        Self {
            id,
            body: Bytes::new(),
            error: Some(failure.into()),
        }
    }

    /// Split into the backend body or the remote failure.
    pub fn into_result(self) -> Result<Bytes> {
        match self.error {
            Some(failure) => Err(failure.into()),
            None => Ok(self.body),
        }
    }

    /// Encode for the wire.
    ///
    /// Untagged replies are the body bytes verbatim; untagged errors become JSON `null`
    /// since that shape has no room for a failure.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let Some(id) = self.id else {
            return Ok(match self.error {
                Some(_) => b"null".to_vec(),
                None => self.body.to_vec(),
            });
        };

        let (status, body, error) = match &self.error {
            Some(e) => (ReplyStatus::Error, None, Some(e.clone())),
            None => {
                let raw: &RawValue = serde_json::from_slice(&self.body).map_err(|e| {
                    PodwireError::Internal(format!("reply body is not json: {e}"))
                })?;
                (ReplyStatus::Ok, Some(raw), None)
            }
        };

        let msg = WireMessage {
            v: PROTOCOL_VERSION,
            kind: Kind::Reply,
            id,
            envelope: None,
            status: Some(status),
            body,
            error,
        };
        to_vec(&msg)
    }
}

/// Encode a command for the wire. `None` produces the untagged (bare envelope) shape.
pub fn encode_command(id: Option<RequestId>, envelope: &Envelope) -> Result<Vec<u8>> {
    let Some(id) = id else {
        return envelope.to_json();
    };
    let msg = WireMessage {
        v: PROTOCOL_VERSION,
        kind: Kind::Command,
        id,
        envelope: Some(envelope.clone()),
        status: None,
        body: None,
        error: None,
    };
    to_vec(&msg)
}

/// Classify one frame payload.
///
/// Only a payload that announces itself as tagged (`v` and `kind` present) but
/// is otherwise malformed yields an error. Untagged payloads always classify.
pub fn decode(payload: &[u8]) -> Result<Inbound> {
    if is_tagged(payload) {
        return decode_tagged(payload);
    }
    Ok(classify_untagged(payload))
}

/// Untagged inference: non-empty `Method` means command, everything else is a reply.
pub fn classify_untagged(payload: &[u8]) -> Inbound {
    if !is_json_object(payload) {
        return Inbound::Reply(Reply::ok(None, Bytes::copy_from_slice(payload)));
    }
    match Envelope::from_json(payload) {
        Ok(envelope) if envelope.is_command() => Inbound::Command { id: None, envelope },
        Ok(_) => Inbound::Reply(Reply::ok(None, Bytes::copy_from_slice(payload))),
        Err(e) => {
            tracing::debug!(error = %e, len = payload.len(), "payload is not an envelope; treating as reply");
            Inbound::Reply(Reply::ok(None, Bytes::copy_from_slice(payload)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Kind {
    Command,
    Reply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplyStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage<'a> {
    v: u8,
    kind: Kind,
    id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    envelope: Option<Envelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<ReplyStatus>,
    #[serde(default, borrow, skip_serializing_if = "Option::is_none")]
    body: Option<&'a RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<RemoteFailure>,
}

/// Cheap look at the top-level keys; other fields are skipped.
#[derive(Deserialize)]
struct Probe {
    #[serde(default)]
    v: Option<serde_json::Value>,
    #[serde(default)]
    kind: Option<serde_json::Value>,
}

fn is_json_object(payload: &[u8]) -> bool {
    payload.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}

fn is_tagged(payload: &[u8]) -> bool {
    if !is_json_object(payload) {
        return false;
    }
    match serde_json::from_slice::<Probe>(payload) {
        Ok(p) => p.v.is_some() && p.kind.is_some(),
        Err(_) => false,
    }
}

fn decode_tagged(payload: &[u8]) -> Result<Inbound> {
    let msg: WireMessage<'_> = serde_json::from_slice(payload)
        .map_err(|e| PodwireError::BadRequest(format!("invalid tagged message: {e}")))?;

    if msg.v != PROTOCOL_VERSION {
        return Err(PodwireError::UnsupportedVersion);
    }

    match msg.kind {
        Kind::Command => {
            let envelope = msg
                .envelope
                .ok_or_else(|| PodwireError::BadRequest("command without envelope".into()))?;
            if !envelope.is_command() {
                return Err(PodwireError::BadRequest("command envelope has no method".into()));
            }
            Ok(Inbound::Command {
                id: Some(msg.id),
                envelope,
            })
        }
        Kind::Reply => match msg.status {
            Some(ReplyStatus::Ok) => {
                let body = msg.body.map(|raw| raw.get()).unwrap_or("null");
                Ok(Inbound::Reply(Reply::ok(
                    Some(msg.id),
                    Bytes::copy_from_slice(body.as_bytes()),
                )))
            }
            Some(ReplyStatus::Error) => {
                let failure = msg
                    .error
                    .ok_or_else(|| PodwireError::BadRequest("error reply without error".into()))?;
                Ok(Inbound::Reply(Reply::err(Some(msg.id), failure)))
            }
            None => Err(PodwireError::BadRequest("reply without status".into())),
        },
    }
}

fn to_vec<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| PodwireError::Internal(format!("encode message failed: {e}")))
}
