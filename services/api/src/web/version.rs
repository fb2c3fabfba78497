//! services/api/src/web/version.rs
//!
//! Public version endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
}

/// GET /version/api - Version of this service
#[utoipa::path(
    get,
    path = "/version/api",
    responses((status = 200, description = "API version", body = VersionResponse)),
    tag = "version"
)]
pub async fn api_version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /version/web - Version of the web client this deployment expects
#[utoipa::path(
    get,
    path = "/version/web",
    responses((status = 200, description = "Web client version", body = VersionResponse)),
    tag = "version"
)]
pub async fn web_version_handler(State(state): State<Arc<AppState>>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.config.web_version.clone(),
    })
}
