//! Axum router wiring for the local gateway.
//!
//! `GET /` answers locally; every `/containers` route is forwarded through the tunnel.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::health))
        .route("/containers/list", get(api::list_containers))
        .route("/containers/create", post(api::create_container))
        .route(
            "/containers/:id",
            get(api::inspect_container).delete(api::delete_container),
        )
        .with_state(state)
}
