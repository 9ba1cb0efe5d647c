//! Repositories for database operations
//!
//! Each repository is constructed with a `PgPool` handle and owned by the
//! application state; nothing here is a process-wide singleton.

use common::UserRole;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::error;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{RoleDistribution, UserProfile, UserStatistics};

pub mod request;
pub mod software;

/// Map a parse failure on a stored enum to an internal error; rows only
/// ever contain values written through the closed enums, so this firing
/// means the data was tampered with out of band.
pub(crate) fn corrupt_row(what: &str, detail: String) -> ApiError {
    error!("Corrupt {} row: {}", what, detail);
    ApiError::Internal
}

fn map_profile_row(row: &PgRow) -> ApiResult<UserProfile> {
    let role: String = row.get("role");

    Ok(UserProfile {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role: role
            .parse::<UserRole>()
            .map_err(|e| corrupt_row("user", e))?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

const PROFILE_COLUMNS: &str = "id, username, email, role, is_active, created_at";

/// User repository for profile and administration operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// Find a user by exact username
    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// Find a user by exact email
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// List all users, newest first
    pub async fn find_all(&self) -> ApiResult<Vec<UserProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_profile_row).collect()
    }

    /// List users holding a role
    pub async fn find_by_role(&self, role: UserRole) -> ApiResult<Vec<UserProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at DESC"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_profile_row).collect()
    }

    /// Search users by username or email substring
    pub async fn search(&self, query: &str) -> ApiResult<Vec<UserProfile>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM users
            WHERE username ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_profile_row).collect()
    }

    /// Update the caller's own profile fields (username and/or email)
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($1, username),
                email = COALESCE($2, email)
            WHERE id = $3
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// Change a user's role (admin operation)
    pub async fn update_role(&self, id: Uuid, role: UserRole) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET role = $1 WHERE id = $2 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// Activate or deactivate a user (admin operation)
    pub async fn update_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> ApiResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_active = $1 WHERE id = $2 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_profile_row).transpose()
    }

    /// Aggregate counts for the admin dashboard
    pub async fn statistics(&self) -> ApiResult<UserStatistics> {
        let totals = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_active) AS active,
                   COUNT(*) FILTER (WHERE NOT is_active) AS inactive
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let role_rows = sqlx::query("SELECT role, COUNT(*) AS count FROM users GROUP BY role")
            .fetch_all(&self.pool)
            .await?;

        let mut role_distribution = RoleDistribution::default();
        for row in &role_rows {
            let role: String = row.get("role");
            let count: i64 = row.get("count");
            match role.parse::<UserRole>().map_err(|e| corrupt_row("user", e))? {
                UserRole::Employee => role_distribution.employee = count,
                UserRole::Manager => role_distribution.manager = count,
                UserRole::Admin => role_distribution.admin = count,
            }
        }

        Ok(UserStatistics {
            total: totals.get("total"),
            active: totals.get("active"),
            inactive: totals.get("inactive"),
            role_distribution,
        })
    }
}
