//! Software catalog repository

use common::AccessLevel;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::software::Software;

use super::corrupt_row;

pub(crate) fn map_software_row(row: &PgRow) -> ApiResult<Software> {
    let levels: Vec<String> = row.get("access_levels");
    let access_levels = levels
        .iter()
        .map(|l| l.parse::<AccessLevel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt_row("software", e))?;

    Ok(Software {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        access_levels,
        created_at: row.get("created_at"),
    })
}

const SOFTWARE_COLUMNS: &str = "id, name, description, access_levels, created_at";

/// Returns true when the error is a Postgres unique-constraint violation
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}

/// Software repository
#[derive(Clone)]
pub struct SoftwareRepository {
    pool: PgPool,
}

impl SoftwareRepository {
    /// Create a new software repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a software entry. A duplicate name maps to a conflict.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        access_levels: &[AccessLevel],
    ) -> ApiResult<Software> {
        let levels: Vec<String> = access_levels.iter().map(|l| l.to_string()).collect();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO software (name, description, access_levels)
            VALUES ($1, $2, $3)
            RETURNING {SOFTWARE_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(levels)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Software with this name already exists".to_string())
            } else {
                ApiError::Database(e)
            }
        })?;

        map_software_row(&row)
    }

    /// Find a software entry by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Software>> {
        let row = sqlx::query(&format!(
            "SELECT {SOFTWARE_COLUMNS} FROM software WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_software_row).transpose()
    }

    /// Find a software entry by exact name
    pub async fn find_by_name(&self, name: &str) -> ApiResult<Option<Software>> {
        let row = sqlx::query(&format!(
            "SELECT {SOFTWARE_COLUMNS} FROM software WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_software_row).transpose()
    }

    /// List the catalog, newest first
    pub async fn find_all(&self) -> ApiResult<Vec<Software>> {
        let rows = sqlx::query(&format!(
            "SELECT {SOFTWARE_COLUMNS} FROM software ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_software_row).collect()
    }

    /// Replace a software entry's fields
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
        access_levels: &[AccessLevel],
    ) -> ApiResult<Option<Software>> {
        let levels: Vec<String> = access_levels.iter().map(|l| l.to_string()).collect();

        let row = sqlx::query(&format!(
            r#"
            UPDATE software
            SET name = $1, description = $2, access_levels = $3
            WHERE id = $4
            RETURNING {SOFTWARE_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(levels)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Software with this name already exists".to_string())
            } else {
                ApiError::Database(e)
            }
        })?;

        row.as_ref().map(map_software_row).transpose()
    }

    /// Delete a software entry, reporting whether a row was removed
    pub async fn delete(&self, id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM software WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
