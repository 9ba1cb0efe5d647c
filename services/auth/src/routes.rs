//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use common::UserRole;

use crate::{
    AppState,
    jwt::TokenType,
    models::{LoginCredentials, NewUser, RegisterRequest, UserResponse},
    validation,
};

/// Response for a successful login: the user minus secrets, plus tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token (refresh and logout)
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if !state.rate_limiter.is_allowed(&payload.username).await {
        return Err(AuthError::TooManyRequests);
    }

    validation::validate_username(&payload.username).map_err(AuthError::Validation)?;
    validation::validate_email(&payload.email).map_err(AuthError::Validation)?;
    validation::validate_password(&payload.password).map_err(AuthError::Validation)?;

    if let Some(existing) = state
        .user_repository
        .find_by_username_or_email(&payload.username)
        .await
        .map_err(internal)?
        .or(state
            .user_repository
            .find_by_username_or_email(&payload.email)
            .await
            .map_err(internal)?)
    {
        let field = if existing.username == payload.username {
            "Username"
        } else {
            "Email"
        };
        return Err(AuthError::Validation(format!("{} already exists", field)));
    }

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        role: payload.role.unwrap_or(UserRole::Employee),
    };

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(internal)?;

    info!("User registered successfully: {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.username_or_email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "Username/Email and password are required".to_string(),
        ));
    }

    if !state.rate_limiter.is_allowed(&payload.username_or_email).await {
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username_or_email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AuthError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_active {
        warn!("Login attempt for deactivated account: {}", user.id);
        return Err(AuthError::Unauthorized(
            "Account is deactivated. Please contact administrator.".to_string(),
        ));
    }

    let password_valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(internal)?;
    if !password_valid {
        return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(internal)?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(internal)?;

    // One active refresh token per user
    state
        .user_repository
        .update_refresh_token(user.id, Some(&refresh_token))
        .await
        .map_err(internal)?;

    info!("User logged in successfully: {}", user.id);
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: state.jwt_service.access_token_expiry(),
        }),
    ))
}

/// Refresh token endpoint: verifies and rotates the stored refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AuthError::Unauthorized("Refresh token expired".to_string())
            }
            _ => AuthError::Unauthorized("Invalid refresh token".to_string()),
        })?;

    if claims.token_type != TokenType::Refresh {
        return Err(AuthError::Unauthorized("Invalid refresh token".to_string()));
    }

    // The token must also be the user's current stored token
    let user = state
        .user_repository
        .find_by_refresh_token(&payload.refresh_token)
        .await
        .map_err(internal)?
        .filter(|user| user.id == claims.sub)
        .ok_or_else(|| AuthError::Unauthorized("Invalid refresh token".to_string()))?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(internal)?;
    let new_refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(internal)?;

    state
        .user_repository
        .update_refresh_token(user.id, Some(&new_refresh_token))
        .await
        .map_err(internal)?;

    info!("Token refreshed successfully: {}", user.id);
    Ok((
        StatusCode::OK,
        Json(TokenPairResponse {
            access_token,
            refresh_token: new_refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: state.jwt_service.access_token_expiry(),
        }),
    ))
}

/// Logout endpoint. Clearing an unknown refresh token is a no-op success.
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(user) = state
        .user_repository
        .find_by_refresh_token(&payload.refresh_token)
        .await
        .map_err(internal)?
    {
        state
            .user_repository
            .update_refresh_token(user.id, None)
            .await
            .map_err(internal)?;
        info!("User logged out successfully: {}", user.id);
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Successfully logged out"})),
    ))
}

fn internal(e: anyhow::Error) -> AuthError {
    error!("Auth service error: {:#}", e);
    AuthError::InternalServerError
}

/// Custom error type for authentication errors
#[derive(Debug)]
pub enum AuthError {
    Validation(String),
    Unauthorized(String),
    TooManyRequests,
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, please try again later".to_string(),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let cases = [
            (
                AuthError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AuthError::Unauthorized("no".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (AuthError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
            (
                AuthError::InternalServerError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
