//! Request envelope (JSON).
//!
//! Field names follow the established wire shape: `Method`, `Uri`, `Header`,
//! `Body` (base64 string), `Params` (array of `{"Key", "Value"}` or `null`).
//! An empty `Method` marks a payload that is not a command.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PodwireError, Result};

/// Header name -> ordered values.
pub type Headers = BTreeMap<String, Vec<String>>;

/// HTTP verb a command carries.
///
/// Verbs outside the common set are kept verbatim in `Other` so the payload
/// still classifies as a command; no route is ever bound to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(verb) => verb,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PodwireError;

    /// Case-sensitive, like HTTP: `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(PodwireError::BadRequest("empty method".into())),
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Ok(Method::Other(other.to_string())),
        }
    }
}

/// One bound path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Ordered path-parameter bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Param {
            key: key.into(),
            value: value.into(),
        });
    }

    /// First value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// HTTP-style command record carried through the tunnel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Verb, or `None` when the payload is not a command.
    #[serde(rename = "Method", default, with = "method_field")]
    pub method: Option<Method>,
    /// Request URI as received (path plus optional query).
    #[serde(rename = "Uri", default)]
    pub uri: String,
    #[serde(rename = "Header", default, deserialize_with = "null_as_default")]
    pub header: Headers,
    /// Raw request body.
    #[serde(rename = "Body", default, with = "body_field")]
    pub body: Vec<u8>,
    /// Path parameters bound by the sender's router, if it had any.
    #[serde(rename = "Params", default)]
    pub params: Option<Params>,
}

impl Envelope {
    /// New command envelope with no headers, body or params.
    pub fn command(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, header: Headers) -> Self {
        self.header = header;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// True when the envelope carries a verb.
    pub fn is_command(&self) -> bool {
        self.method.is_some()
    }

    /// URI without the query string.
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| PodwireError::Internal(format!("encode envelope failed: {e}")))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| PodwireError::BadRequest(format!("invalid envelope json: {e}")))
    }
}

fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

mod method_field {
    use super::*;

    pub fn serialize<S: Serializer>(m: &Option<Method>, ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_str(m.as_ref().map(Method::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<Method>, D::Error> {
        let s: Option<String> = Option::deserialize(de)?;
        match s.as_deref() {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

mod body_field {
    use super::*;

    pub fn serialize<S: Serializer>(body: &[u8], ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Vec<u8>, D::Error> {
        let s: Option<String> = Option::deserialize(de)?;
        match s {
            None => Ok(Vec::new()),
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
        }
    }
}
