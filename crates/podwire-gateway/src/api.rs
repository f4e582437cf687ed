//! HTTP handlers for the local gateway.
//!
//! Every container endpoint is a thin shell: the `Forward` extractor turns the
//! incoming request into an `Envelope`, the tunnel client carries it to the
//! remote peer, and the JSON reply is reshaped for the caller.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use podwire_core::error::PodwireError;
use podwire_core::protocol::{Envelope, Headers, Method, Params};

use crate::app_state::AppState;
use crate::backend::{ContainerDetail, ContainerSummary, CreateResponse};

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// `PodwireError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PodwireError);

impl From<PodwireError> for ApiError {
    fn from(e: PodwireError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PodwireError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PodwireError::NotFound(_) => StatusCode::NOT_FOUND,
            PodwireError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            PodwireError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PodwireError::PeerClosed
            | PodwireError::Transport(_)
            | PodwireError::UnsupportedVersion => StatusCode::BAD_GATEWAY,
            PodwireError::Backend(_) | PodwireError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// The incoming request as a command envelope.
pub struct Forward(pub Envelope);

#[async_trait]
impl<S> FromRequest<S> for Forward
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        // Percent-decoded, so the remote sees the same id the handlers report.
        let params: Params = match Path::<Vec<(String, String)>>::from_request_parts(&mut parts, state).await {
            Ok(Path(bound)) => bound.into_iter().collect(),
            Err(_) => Params::new(),
        };
        let method: Method = parts.method.as_str().parse()?;
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let body = axum::body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
            PodwireError::BadRequest(format!("failed to read request body: {e}"))
        })?;

        let envelope = Envelope::command(method, uri)
            .with_header(collect_headers(&parts.headers))
            .with_body(body.to_vec())
            .with_params(params);
        Ok(Forward(envelope))
    }
}

fn collect_headers(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            out.entry(name.as_str().to_string())
                .or_default()
                .push(v.to_string());
        }
    }
    out
}

fn decode_reply<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(PodwireError::Backend(format!("malformed reply from peer: {e}"))))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "data": "Server is up and running" }))
}

pub async fn list_containers(
    State(app): State<AppState>,
    Forward(env): Forward,
) -> Result<Json<Value>, ApiError> {
    let body = app.client().call(env).await?;
    let containers: Option<Vec<ContainerSummary>> = decode_reply(&body)?;
    Ok(Json(json!({ "containers": containers })))
}

pub async fn create_container(
    State(app): State<AppState>,
    Forward(env): Forward,
) -> Result<Json<Value>, ApiError> {
    let body = app.client().call(env).await?;
    let result: Option<CreateResponse> = decode_reply(&body)?;
    Ok(Json(json!({ "result": result })))
}

pub async fn inspect_container(
    State(app): State<AppState>,
    Forward(env): Forward,
) -> Result<Json<Value>, ApiError> {
    let body = app.client().call(env).await?;
    let result: Option<ContainerDetail> = decode_reply(&body)?;
    Ok(Json(json!({ "result": result })))
}

pub async fn delete_container(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Forward(env): Forward,
) -> Result<Json<Value>, ApiError> {
    app.client().call(env).await?;
    Ok(Json(json!({ "message": format!("Container {id} deleted") })))
}
