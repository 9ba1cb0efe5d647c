//! API models for request and response payloads

use chrono::{DateTime, Utc};
use common::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod request;
pub mod software;

/// User payload returned by the API, without secrets
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Abbreviated user payload embedded in joined views
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Profile update request (role/active flag/credentials are not
/// self-serviceable)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Admin request to change a user's role
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Admin request to activate or deactivate a user
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

/// Query parameters for user search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Per-role user counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleDistribution {
    pub employee: i64,
    pub manager: i64,
    pub admin: i64,
}

/// Aggregate user statistics for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct UserStatistics {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub role_distribution: RoleDistribution,
}
