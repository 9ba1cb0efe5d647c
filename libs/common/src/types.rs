//! Closed domain enumerations shared by every service
//!
//! Roles, access levels, and request statuses are persisted as text and
//! travel over the wire as strings. Every service parses them through the
//! enums below so the accepted spellings exist in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user holds within the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Employee,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "Employee",
            UserRole::Manager => "Manager",
            UserRole::Admin => "Admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Employee" => Ok(UserRole::Employee),
            "Manager" => Ok(UserRole::Manager),
            "Admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// Granularity at which access to a software entry can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "Read",
            AccessLevel::Write => "Write",
            AccessLevel::Admin => "Admin",
        }
    }

    /// Render a set of levels the way user-facing messages list them,
    /// e.g. `"Read, Write"`.
    pub fn join(levels: &[AccessLevel]) -> String {
        levels
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Read" => Ok(AccessLevel::Read),
            "Write" => Ok(AccessLevel::Write),
            "Admin" => Ok(AccessLevel::Admin),
            other => Err(format!("Unknown access level: {}", other)),
        }
    }
}

/// Lifecycle status of an access request
///
/// `Pending` is the sole initial state. `Approved` and `Rejected` are
/// terminal: once a decision is recorded the request never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }

    /// Whether this status ends the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    /// Whether this status is a valid target for a transition. Re-entry
    /// into `Pending` is not a supported transition.
    pub fn is_decision(&self) -> bool {
        self.is_terminal()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("Unknown request status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Employee, UserRole::Manager, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("User".parse::<UserRole>().is_err());
        assert!("employee".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_access_level_round_trip() {
        for level in [AccessLevel::Read, AccessLevel::Write, AccessLevel::Admin] {
            assert_eq!(level.as_str().parse::<AccessLevel>().unwrap(), level);
        }
        assert!("ReadWrite".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn test_access_level_join() {
        assert_eq!(
            AccessLevel::join(&[AccessLevel::Read, AccessLevel::Write]),
            "Read, Write"
        );
        assert_eq!(AccessLevel::join(&[]), "");
    }

    #[test]
    fn test_request_status_terminality() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());

        assert!(!RequestStatus::Pending.is_decision());
        assert!(RequestStatus::Approved.is_decision());
        assert!(RequestStatus::Rejected.is_decision());
    }

    #[test]
    fn test_serde_spelling_matches_storage() {
        let json = serde_json::to_string(&RequestStatus::Approved).unwrap();
        assert_eq!(json, "\"Approved\"");
        let parsed: UserRole = serde_json::from_str("\"Manager\"").unwrap();
        assert_eq!(parsed, UserRole::Manager);
    }
}
