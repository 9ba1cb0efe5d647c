//! Input validation for the API payloads

use common::{AccessLevel, RequestStatus};

/// Validate the reason attached to an access request
pub fn validate_reason(reason: &str) -> Result<(), String> {
    let trimmed = reason.trim();

    if trimmed.is_empty() {
        return Err("Reason is required".to_string());
    }

    if trimmed.len() < 10 {
        return Err("Reason must be at least 10 characters long".to_string());
    }

    Ok(())
}

/// Parse the requested access type
pub fn parse_access_type(access_type: &str) -> Result<AccessLevel, String> {
    access_type
        .parse::<AccessLevel>()
        .map_err(|_| "Access type must be Read, Write, or Admin".to_string())
}

/// Parse a decision status. Only the terminal statuses are accepted;
/// re-entry into Pending is not a supported transition.
pub fn parse_decision_status(status: &str) -> Result<RequestStatus, String> {
    let parsed = status
        .parse::<RequestStatus>()
        .map_err(|_| "Status must be either Approved or Rejected".to_string())?;

    if !parsed.is_decision() {
        return Err("Status must be either Approved or Rejected".to_string());
    }

    Ok(parsed)
}

/// Validate a software name
pub fn validate_software_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Software name is required".to_string());
    }

    if trimmed.len() < 2 {
        return Err("Software name must be at least 2 characters long".to_string());
    }

    Ok(())
}

/// Validate a software description
pub fn validate_software_description(description: &str) -> Result<(), String> {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err("Description is required".to_string());
    }

    if trimmed.len() < 10 {
        return Err("Description must be at least 10 characters long".to_string());
    }

    Ok(())
}

/// Parse the set of access levels offered by a software entry. The set must
/// be non-empty and every member must be a known level; unknown members are
/// named in the error.
pub fn parse_access_levels(levels: &[String]) -> Result<Vec<AccessLevel>, String> {
    if levels.is_empty() {
        return Err("At least one access level is required".to_string());
    }

    let mut parsed: Vec<AccessLevel> = Vec::with_capacity(levels.len());
    let mut invalid: Vec<&str> = Vec::new();

    for level in levels {
        match level.parse::<AccessLevel>() {
            Ok(level) => {
                if !parsed.contains(&level) {
                    parsed.push(level);
                }
            }
            Err(_) => invalid.push(level.as_str()),
        }
    }

    if !invalid.is_empty() {
        return Err(format!("Invalid access levels: {}", invalid.join(", ")));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("need it for project X").is_ok());

        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert_eq!(
            validate_reason("too short").unwrap_err(),
            "Reason must be at least 10 characters long"
        );
    }

    #[test]
    fn test_parse_access_type() {
        assert_eq!(parse_access_type("Write").unwrap(), AccessLevel::Write);
        assert_eq!(
            parse_access_type("Execute").unwrap_err(),
            "Access type must be Read, Write, or Admin"
        );
    }

    #[test]
    fn test_parse_decision_status() {
        assert_eq!(
            parse_decision_status("Approved").unwrap(),
            RequestStatus::Approved
        );
        assert_eq!(
            parse_decision_status("Rejected").unwrap(),
            RequestStatus::Rejected
        );

        // Pending parses as a status but is not a valid decision
        assert_eq!(
            parse_decision_status("Pending").unwrap_err(),
            "Status must be either Approved or Rejected"
        );
        assert!(parse_decision_status("Cancelled").is_err());
    }

    #[test]
    fn test_validate_software_fields() {
        assert!(validate_software_name("Grafana").is_ok());
        assert!(validate_software_name("G").is_err());
        assert!(validate_software_name("").is_err());

        assert!(validate_software_description("Dashboards for the platform team").is_ok());
        assert!(validate_software_description("short").is_err());
    }

    #[test]
    fn test_parse_access_levels() {
        assert_eq!(
            parse_access_levels(&["Read".to_string(), "Write".to_string()]).unwrap(),
            vec![AccessLevel::Read, AccessLevel::Write]
        );

        // Duplicates collapse
        assert_eq!(
            parse_access_levels(&["Read".to_string(), "Read".to_string()]).unwrap(),
            vec![AccessLevel::Read]
        );

        assert_eq!(
            parse_access_levels(&[]).unwrap_err(),
            "At least one access level is required"
        );
        assert_eq!(
            parse_access_levels(&["Read".to_string(), "Execute".to_string(), "Root".to_string()])
                .unwrap_err(),
            "Invalid access levels: Execute, Root"
        );
    }
}
