//! Access request routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{APPROVER_ROLES, AuthUser, require_roles},
    models::request::{CreateAccessRequest, DecisionResponse, UpdateRequestStatus},
    validation,
};

/// Routes under `/requests`
pub fn router() -> Router<AppState> {
    let approver_routes = Router::new()
        .route("/requests/pending", get(pending_requests))
        .route("/requests/:id/status", put(update_request_status))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(req, next, APPROVER_ROLES)
        }));

    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/my-requests", get(my_requests))
        .route("/requests/:id/history", get(request_history))
        .merge(approver_routes)
}

/// Submit a new access request
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateAccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let access_type =
        validation::parse_access_type(&payload.access_type).map_err(ApiError::Validation)?;
    validation::validate_reason(&payload.reason).map_err(ApiError::Validation)?;

    let request = state
        .request_repository
        .create(user.id, payload.software_id, access_type, payload.reason.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// List the caller's own requests, most recent first
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state.request_repository.find_by_user(user.id).await?;
    Ok(Json(requests))
}

/// The audit trail of a request, most recent first
pub async fn request_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.request_repository.history(id).await?;
    Ok(Json(history))
}

/// List all pending requests, oldest first
pub async fn pending_requests(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state.request_repository.find_pending().await?;
    Ok(Json(requests))
}

/// Decide a pending request (approve or reject)
pub async fn update_request_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestStatus>,
) -> Result<impl IntoResponse, ApiError> {
    let status =
        validation::parse_decision_status(&payload.status).map_err(ApiError::Validation)?;

    let (request, history) = state
        .request_repository
        .update_status(id, user.id, status, payload.comment.as_deref())
        .await?;

    Ok(Json(DecisionResponse { request, history }))
}
