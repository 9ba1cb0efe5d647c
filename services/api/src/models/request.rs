//! Access request and history models

use chrono::{DateTime, Utc};
use common::{AccessLevel, RequestStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UserSummary, software::Software};

/// Access request entity
#[derive(Debug, Clone, Serialize)]
pub struct AccessRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub software_id: Uuid,
    pub access_type: AccessLevel,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One immutable audit record per status transition
#[derive(Debug, Clone, Serialize)]
pub struct RequestHistory {
    pub id: Uuid,
    pub request_id: Uuid,
    pub changed_by_id: Uuid,
    pub old_status: RequestStatus,
    pub new_status: RequestStatus,
    pub comment: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Creation payload. `access_type` arrives as a raw string so the
/// validation layer controls the rejection message.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccessRequest {
    pub software_id: Uuid,
    pub access_type: String,
    pub reason: String,
}

/// Decision payload for `PUT /requests/:id/status`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequestStatus {
    pub status: String,
    pub comment: Option<String>,
}

/// A request joined with the software it targets (requester's view)
#[derive(Debug, Clone, Serialize)]
pub struct RequestWithSoftware {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub software: Software,
}

/// A pending request joined with requester and software (approver's view)
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub user: UserSummary,
    pub software: Software,
}

/// A history record joined with the acting user
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub history: RequestHistory,
    pub changed_by: UserSummary,
}

/// Response for a decision: the updated request and its audit record
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub request: AccessRequest,
    pub history: RequestHistory,
}
