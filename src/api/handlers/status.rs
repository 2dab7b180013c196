//! Service status endpoint.

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::super::envelope::ApiResponse;
use super::ApiState;

/// Liveness payload. No authentication: load balancers poll this.
#[derive(Debug, Serialize)]
pub struct HealthPayload {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub plant: String,
    pub site: String,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(HealthPayload {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        plant: state.plant.name.clone(),
        site: state.plant.site.clone(),
    })
}
