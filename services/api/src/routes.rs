//! API service routes

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use serde_json::json;

use crate::{AppState, middleware::auth_middleware};

pub mod requests;
pub mod software;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .merge(requests::router())
        .merge(software::router())
        .merge(users::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(authenticated)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "api-service"
    }))
}
