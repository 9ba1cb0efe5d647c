//! Access-request lifecycle repository
//!
//! Owns the request state machine: creation into `Pending`, the one-shot
//! decision transition, and the append-only history trail. The decision
//! transition performs its two writes (status update + history insert)
//! inside a single transaction so no observer can ever see a decided
//! request without its audit record, or an audit record for a request
//! still reading `Pending`.

use common::{AccessLevel, RequestStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::UserSummary;
use crate::models::request::{
    AccessRequest, HistoryEntry, PendingRequest, RequestHistory, RequestWithSoftware,
};
use crate::models::software::Software;

use super::corrupt_row;

fn map_request_row(row: &PgRow) -> ApiResult<AccessRequest> {
    let access_type: String = row.get("access_type");
    let status: String = row.get("status");

    Ok(AccessRequest {
        id: row.get("id"),
        user_id: row.get("user_id"),
        software_id: row.get("software_id"),
        access_type: access_type
            .parse::<AccessLevel>()
            .map_err(|e| corrupt_row("request", e))?,
        reason: row.get("reason"),
        status: status
            .parse::<RequestStatus>()
            .map_err(|e| corrupt_row("request", e))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_history_row(row: &PgRow) -> ApiResult<RequestHistory> {
    let old_status: String = row.get("old_status");
    let new_status: String = row.get("new_status");

    Ok(RequestHistory {
        id: row.get("id"),
        request_id: row.get("request_id"),
        changed_by_id: row.get("changed_by_id"),
        old_status: old_status
            .parse::<RequestStatus>()
            .map_err(|e| corrupt_row("request_history", e))?,
        new_status: new_status
            .parse::<RequestStatus>()
            .map_err(|e| corrupt_row("request_history", e))?,
        comment: row.get("comment"),
        changed_at: row.get("changed_at"),
    })
}

/// Map a joined row whose software columns carry an `s_` prefix
fn map_joined_software(row: &PgRow) -> ApiResult<Software> {
    let levels: Vec<String> = row.get("s_access_levels");
    let access_levels = levels
        .iter()
        .map(|l| l.parse::<AccessLevel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt_row("software", e))?;

    Ok(Software {
        id: row.get("s_id"),
        name: row.get("s_name"),
        description: row.get("s_description"),
        access_levels,
        created_at: row.get("s_created_at"),
    })
}

/// Map a joined row whose user columns carry a `u_` prefix
fn map_joined_user(row: &PgRow) -> UserSummary {
    UserSummary {
        id: row.get("u_id"),
        username: row.get("u_username"),
        email: row.get("u_email"),
    }
}

const REQUEST_COLUMNS: &str =
    "id, user_id, software_id, access_type, reason, status, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, request_id, changed_by_id, old_status, new_status, comment, changed_at";

/// Access request repository
#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new access request in the `Pending` state.
    ///
    /// The requested access type must be one of the levels the software
    /// offers; the rejection message enumerates the offered set. No history
    /// record is written for the initial state — the trail begins at the
    /// first transition.
    pub async fn create(
        &self,
        user_id: Uuid,
        software_id: Uuid,
        access_type: AccessLevel,
        reason: &str,
    ) -> ApiResult<AccessRequest> {
        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        let software_row = sqlx::query(
            "SELECT id, name, description, access_levels, created_at FROM software WHERE id = $1",
        )
        .bind(software_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Software not found".to_string()))?;

        let software = super::software::map_software_row(&software_row)?;
        software
            .ensure_access_allowed(access_type)
            .map_err(ApiError::Validation)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO requests (user_id, software_id, access_type, reason, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(software_id)
        .bind(access_type.as_str())
        .bind(reason)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        let request = map_request_row(&row)?;
        info!("Access request created: {} by user {}", request.id, user_id);
        Ok(request)
    }

    /// List a user's own requests, most recent first, each joined with its
    /// software entry
    pub async fn find_by_user(&self, user_id: Uuid) -> ApiResult<Vec<RequestWithSoftware>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.software_id, r.access_type, r.reason, r.status,
                   r.created_at, r.updated_at,
                   s.id AS s_id, s.name AS s_name, s.description AS s_description,
                   s.access_levels AS s_access_levels, s.created_at AS s_created_at
            FROM requests r
            JOIN software s ON s.id = r.software_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RequestWithSoftware {
                    request: map_request_row(row)?,
                    software: map_joined_software(row)?,
                })
            })
            .collect()
    }

    /// List all pending requests oldest first (first-in-first-out triage),
    /// each joined with requester and software
    pub async fn find_pending(&self) -> ApiResult<Vec<PendingRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.software_id, r.access_type, r.reason, r.status,
                   r.created_at, r.updated_at,
                   u.id AS u_id, u.username AS u_username, u.email AS u_email,
                   s.id AS s_id, s.name AS s_name, s.description AS s_description,
                   s.access_levels AS s_access_levels, s.created_at AS s_created_at
            FROM requests r
            JOIN users u ON u.id = r.user_id
            JOIN software s ON s.id = r.software_id
            WHERE r.status = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(RequestStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequest {
                    request: map_request_row(row)?,
                    user: map_joined_user(row),
                    software: map_joined_software(row)?,
                })
            })
            .collect()
    }

    /// Decide a pending request.
    ///
    /// Both writes happen inside one transaction, with the request row
    /// locked for the duration. A request that already carries a decision
    /// cannot be decided again, and the actor must not be the requester.
    pub async fn update_status(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        new_status: RequestStatus,
        comment: Option<&str>,
    ) -> ApiResult<(AccessRequest, RequestHistory)> {
        if !new_status.is_decision() {
            return Err(ApiError::Validation(
                "Status must be either Approved or Rejected".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        let request = map_request_row(&row)?;

        if request.user_id == actor_id {
            return Err(ApiError::Forbidden(
                "Cannot decide your own access request".to_string(),
            ));
        }

        let old_status = request.status;
        if old_status.is_terminal() {
            return Err(ApiError::Conflict(format!(
                "Request has already been {}",
                old_status
            )));
        }

        let updated_row = sqlx::query(&format!(
            r#"
            UPDATE requests
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(new_status.as_str())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        let history_row = sqlx::query(&format!(
            r#"
            INSERT INTO request_history (request_id, changed_by_id, old_status, new_status, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(actor_id)
        .bind(old_status.as_str())
        .bind(new_status.as_str())
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let request = map_request_row(&updated_row)?;
        let history = map_history_row(&history_row)?;

        info!(
            "Request status updated: {} {} -> {} by {}",
            request_id, old_status, new_status, actor_id
        );

        Ok((request, history))
    }

    /// The audit trail of a request, most recent first, each record joined
    /// with the acting user
    pub async fn history(&self, request_id: Uuid) -> ApiResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT h.id, h.request_id, h.changed_by_id, h.old_status, h.new_status,
                   h.comment, h.changed_at,
                   u.id AS u_id, u.username AS u_username, u.email AS u_email
            FROM request_history h
            JOIN users u ON u.id = h.changed_by_id
            WHERE h.request_id = $1
            ORDER BY h.changed_at DESC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(HistoryEntry {
                    history: map_history_row(row)?,
                    changed_by: map_joined_user(row),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool};

    async fn test_pool() -> PgPool {
        let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
        init_pool(&config).await.expect("failed to connect")
    }

    async fn seed_user(pool: &PgPool, role: &str) -> Uuid {
        let tag = Uuid::new_v4().simple().to_string();
        sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, 'x', $3)
            RETURNING id
            "#,
        )
        .bind(format!("user_{tag}"))
        .bind(format!("user_{tag}@example.com"))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_software(pool: &PgPool, levels: &[&str]) -> Uuid {
        let tag = Uuid::new_v4().simple().to_string();
        let levels: Vec<String> = levels.iter().map(|l| l.to_string()).collect();
        sqlx::query_scalar(
            r#"
            INSERT INTO software (name, description, access_levels)
            VALUES ($1, 'Seeded catalog entry for lifecycle tests', $2)
            RETURNING id
            "#,
        )
        .bind(format!("software_{tag}"))
        .bind(levels)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a provisioned PostgreSQL database"]
    async fn test_create_validates_access_type_against_the_catalog() {
        let pool = test_pool().await;
        let repo = RequestRepository::new(pool.clone());

        let employee = seed_user(&pool, "Employee").await;
        let software = seed_software(&pool, &["Read", "Write"]).await;

        let request = repo
            .create(employee, software, AccessLevel::Write, "need it for project X")
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.updated_at.is_none());

        let err = repo
            .create(employee, software, AccessLevel::Admin, "need it for project X")
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("Read, Write"), "{msg}"),
            other => panic!("expected Validation, got {other:?}"),
        }

        let err = repo
            .create(employee, Uuid::new_v4(), AccessLevel::Read, "need it for project X")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires a provisioned PostgreSQL database"]
    async fn test_decision_is_transactional_one_shot_and_audited() {
        let pool = test_pool().await;
        let repo = RequestRepository::new(pool.clone());

        let employee = seed_user(&pool, "Employee").await;
        let manager = seed_user(&pool, "Manager").await;
        let software = seed_software(&pool, &["Read", "Write"]).await;

        let request = repo
            .create(employee, software, AccessLevel::Read, "quarterly reporting access")
            .await
            .unwrap();

        // The requester cannot decide their own request
        let err = repo
            .update_status(request.id, employee, RequestStatus::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let (updated, history) = repo
            .update_status(request.id, manager, RequestStatus::Approved, Some("ok"))
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Approved);
        assert!(updated.updated_at.is_some());
        assert_eq!(history.old_status, RequestStatus::Pending);
        assert_eq!(history.new_status, RequestStatus::Approved);
        assert_eq!(history.changed_by_id, manager);
        assert_eq!(history.comment.as_deref(), Some("ok"));

        // Terminal states cannot be decided again
        let err = repo
            .update_status(request.id, manager, RequestStatus::Rejected, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Exactly one audit record, joined with the actor
        let trail = repo.history(request.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].changed_by.id, manager);

        // Unknown request
        let err = repo
            .update_status(Uuid::new_v4(), manager, RequestStatus::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires a provisioned PostgreSQL database"]
    async fn test_listing_order() {
        let pool = test_pool().await;
        let repo = RequestRepository::new(pool.clone());

        let employee = seed_user(&pool, "Employee").await;
        let software = seed_software(&pool, &["Read"]).await;

        let first = repo
            .create(employee, software, AccessLevel::Read, "first of the two requests")
            .await
            .unwrap();
        let second = repo
            .create(employee, software, AccessLevel::Read, "second of the two requests")
            .await
            .unwrap();

        // The requester's view is newest first
        let mine = repo.find_by_user(employee).await.unwrap();
        let ids: Vec<Uuid> = mine.iter().map(|r| r.request.id).collect();
        let first_pos = ids.iter().position(|id| *id == first.id).unwrap();
        let second_pos = ids.iter().position(|id| *id == second.id).unwrap();
        assert!(second_pos < first_pos);

        // The triage queue is oldest first and Pending only
        let pending = repo.find_pending().await.unwrap();
        assert!(pending.iter().all(|r| r.request.status == RequestStatus::Pending));
        let ids: Vec<Uuid> = pending.iter().map(|r| r.request.id).collect();
        let first_pos = ids.iter().position(|id| *id == first.id).unwrap();
        let second_pos = ids.iter().position(|id| *id == second.id).unwrap();
        assert!(first_pos < second_pos);
    }
}
