//! Application state shared across handlers

use sqlx::PgPool;

use crate::middleware::JwtVerifier;
use crate::repositories::{
    UserRepository, request::RequestRepository, software::SoftwareRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_verifier: JwtVerifier,
    pub user_repository: UserRepository,
    pub software_repository: SoftwareRepository,
    pub request_repository: RequestRepository,
}
