//! API route definitions
//!
//! Endpoints consumed by the productivity dashboard:
//! - /api/v1/auth/*      - login / logout
//! - /api/v1/records     - weigh-in listing, insert, CSV export
//! - /api/v1/incidents   - incident listing, insert
//! - /api/v1/snapshot    - KPI snapshot + fired alerts
//! - /api/v1/leaderboard - ranked worker aggregates
//! - /api/v1/thresholds  - session threshold get/edit
//! - /api/v1/alerts      - session alert log, explicit clear
//! - /api/v1/refresh     - explicit cache invalidation

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Create all API routes for the dashboard.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/records",
            get(handlers::records::list).post(handlers::records::create),
        )
        .route("/records/export", get(handlers::records::export_csv))
        .route(
            "/incidents",
            get(handlers::records::list_incidents).post(handlers::records::create_incident),
        )
        .route("/snapshot", get(handlers::kpi::snapshot))
        .route("/leaderboard", get(handlers::kpi::leaderboard))
        .route(
            "/thresholds",
            get(handlers::thresholds::get_thresholds).put(handlers::thresholds::put_thresholds),
        )
        .route(
            "/alerts",
            get(handlers::alerts::list).delete(handlers::alerts::clear),
        )
        .route("/refresh", post(handlers::records::refresh))
        .with_state(state)
}

/// Unauthenticated liveness endpoint at the root.
pub fn health_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::status::health))
        .with_state(state)
}
