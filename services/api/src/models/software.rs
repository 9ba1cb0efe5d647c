//! Software catalog models

use chrono::{DateTime, Utc};
use common::AccessLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Software entity
#[derive(Debug, Clone, Serialize)]
pub struct Software {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub access_levels: Vec<AccessLevel>,
    pub created_at: DateTime<Utc>,
}

impl Software {
    /// Check that `access_type` may be requested against this software.
    /// The error message enumerates the allowed set.
    pub fn ensure_access_allowed(&self, access_type: AccessLevel) -> Result<(), String> {
        if self.access_levels.contains(&access_type) {
            Ok(())
        } else {
            Err(format!(
                "Invalid access type. Available types: {}",
                AccessLevel::join(&self.access_levels)
            ))
        }
    }
}

/// Creation payload. Access levels arrive as raw strings so that the
/// validation layer can report the offending values instead of a generic
/// deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSoftwareRequest {
    pub name: String,
    pub description: String,
    pub access_levels: Vec<String>,
}

/// Update payload, same field set as creation
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSoftwareRequest {
    pub name: String,
    pub description: String,
    pub access_levels: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn software_with(levels: Vec<AccessLevel>) -> Software {
        Software {
            id: Uuid::new_v4(),
            name: "Grafana".to_string(),
            description: "Dashboards for the platform team".to_string(),
            access_levels: levels,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_allowed_access_type_passes() {
        let software = software_with(vec![AccessLevel::Read, AccessLevel::Write]);
        assert!(software.ensure_access_allowed(AccessLevel::Write).is_ok());
    }

    #[test]
    fn test_disallowed_access_type_enumerates_the_allowed_set() {
        let software = software_with(vec![AccessLevel::Read, AccessLevel::Write]);
        let err = software
            .ensure_access_allowed(AccessLevel::Admin)
            .unwrap_err();
        assert_eq!(err, "Invalid access type. Available types: Read, Write");
    }
}
