//! Software catalog routes

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{ADMIN_ONLY, require_roles},
    models::software::{CreateSoftwareRequest, UpdateSoftwareRequest},
    validation,
};

/// Routes under `/software`
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/software", post(create_software))
        .route("/software/:id", put(update_software))
        .route("/software/:id", delete(delete_software))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(req, next, ADMIN_ONLY)
        }));

    Router::new()
        .route("/software", get(list_software))
        .route("/software/:id", get(get_software))
        .merge(admin_routes)
}

/// List the software catalog
pub async fn list_software(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let software = state.software_repository.find_all().await?;
    Ok(Json(software))
}

/// Get a software entry by ID
pub async fn get_software(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let software = state
        .software_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Software not found".to_string()))?;

    Ok(Json(software))
}

/// Create a software entry (admin)
pub async fn create_software(
    State(state): State<AppState>,
    Json(payload): Json<CreateSoftwareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_software_name(&payload.name).map_err(ApiError::Validation)?;
    validation::validate_software_description(&payload.description)
        .map_err(ApiError::Validation)?;
    let access_levels =
        validation::parse_access_levels(&payload.access_levels).map_err(ApiError::Validation)?;

    if state
        .software_repository
        .find_by_name(payload.name.trim())
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Software with this name already exists".to_string(),
        ));
    }

    let software = state
        .software_repository
        .create(
            payload.name.trim(),
            payload.description.trim(),
            &access_levels,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(software)))
}

/// Replace a software entry (admin)
pub async fn update_software(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSoftwareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_software_name(&payload.name).map_err(ApiError::Validation)?;
    validation::validate_software_description(&payload.description)
        .map_err(ApiError::Validation)?;
    let access_levels =
        validation::parse_access_levels(&payload.access_levels).map_err(ApiError::Validation)?;

    let software = state
        .software_repository
        .update(
            id,
            payload.name.trim(),
            payload.description.trim(),
            &access_levels,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Software not found".to_string()))?;

    Ok(Json(software))
}

/// Delete a software entry (admin)
pub async fn delete_software(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.software_repository.delete(id).await?;

    if deleted {
        Ok(Json(json!({"message": "Software deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Software not found".to_string()))
    }
}
