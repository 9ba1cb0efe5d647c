//! User profile and administration routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, put},
};
use common::UserRole;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{ADMIN_ONLY, AuthUser, require_roles},
    models::{SearchQuery, UpdateActiveRequest, UpdateProfileRequest, UpdateRoleRequest},
};

/// Routes under `/users`
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/statistics", get(user_statistics))
        .route("/users/search", get(search_users))
        .route("/users/by-role/:role", get(users_by_role))
        .route("/users/:id", get(get_user))
        .route("/users/:id/role", put(update_user_role))
        .route("/users/:id/status", put(update_user_status))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(req, next, ADMIN_ONLY)
        }));

    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .merge(admin_routes)
}

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .user_repository
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Update the caller's profile (username and/or email)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(email) = payload.email.as_deref() {
        if let Some(existing) = state.user_repository.find_by_email(email).await? {
            if existing.id != user.id {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
        }
    }

    if let Some(username) = payload.username.as_deref() {
        if let Some(existing) = state.user_repository.find_by_username(username).await? {
            if existing.id != user.id {
                return Err(ApiError::Conflict("Username already in use".to_string()));
            }
        }
    }

    let profile = state
        .user_repository
        .update_profile(
            user.id,
            payload.username.as_deref(),
            payload.email.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_repository.find_all().await?;
    Ok(Json(users))
}

/// Get a user by ID (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Aggregate user statistics (admin)
pub async fn user_statistics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let statistics = state.user_repository.statistics().await?;
    Ok(Json(statistics))
}

/// Search users by username or email (admin)
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_repository.search(&query.q).await?;
    Ok(Json(users))
}

/// List users holding a role (admin)
pub async fn users_by_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let role = role
        .parse::<UserRole>()
        .map_err(|_| ApiError::Validation("Role must be Employee, Manager, or Admin".to_string()))?;

    let users = state.user_repository.find_by_role(role).await?;
    Ok(Json(users))
}

/// Change a user's role (admin). Admins may not change their own role.
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if id == actor.id {
        return Err(ApiError::Forbidden(
            "Cannot modify your own role".to_string(),
        ));
    }

    let user = state
        .user_repository
        .update_role(id, payload.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Activate or deactivate a user (admin). Admins may not change their own
/// active flag.
pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if id == actor.id {
        return Err(ApiError::Forbidden(
            "Cannot modify your own status".to_string(),
        ));
    }

    let user = state
        .user_repository
        .update_active(id, payload.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
