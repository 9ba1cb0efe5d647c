//! Authentication and authorization middleware
//!
//! `auth_middleware` verifies the Bearer token and stashes the principal in
//! the request extensions; `require_roles` gates a route behind a role set.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use common::UserRole;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Roles allowed to triage and decide access requests
pub const APPROVER_ROLES: &[UserRole] = &[UserRole::Manager, UserRole::Admin];

/// Roles allowed to manage users and the software catalog
pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// JWT claims structure (must match what the auth service issues)
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username
    pub username: String,
    /// Role held at issue time
    pub role: UserRole,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated principal extracted from a verified access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Verifies RS256 access tokens issued by the auth service
///
/// The decoding key is built once at startup and shared through the
/// application state.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from the `JWT_PUBLIC_KEY` environment variable
    /// (PEM contents or a path to a PEM file, resolved against CWD and
    /// then the crate root)
    pub fn from_env() -> Result<Self, String> {
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| "JWT_PUBLIC_KEY environment variable not set".to_string())?;

        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| format!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Self::from_pem(&public_key)
    }

    /// Build a verifier from a PEM-encoded RSA public key
    pub fn from_pem(public_key: &str) -> Result<Self, String> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| format!("Failed to create decoding key: {}", e))?;

        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtVerifier {
            decoding_key,
            validation,
        })
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    // Validate the token
    let claims = state.jwt_verifier.verify(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    // Refresh tokens must not be usable against the API
    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized);
    }

    let user = AuthUser {
        id: claims.sub,
        username: claims.username,
        role: claims.role,
    };

    // Insert the principal into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Role-gate middleware: allows the request through only when the
/// authenticated principal holds one of `allowed`
pub async fn require_roles(
    req: Request<Body>,
    next: Next,
    allowed: &'static [UserRole],
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(ApiError::Unauthorized)?;

    if !allowed.contains(&user.role) {
        return Err(ApiError::Forbidden(format!(
            "This action requires one of the following roles: {}",
            allowed
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approver_roles_exclude_employees() {
        assert!(APPROVER_ROLES.contains(&UserRole::Manager));
        assert!(APPROVER_ROLES.contains(&UserRole::Admin));
        assert!(!APPROVER_ROLES.contains(&UserRole::Employee));
        assert_eq!(ADMIN_ONLY, &[UserRole::Admin]);
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        assert!(JwtVerifier::from_pem("not a pem").is_err());
    }
}
