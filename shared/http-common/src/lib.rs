//! Shared HTTP utilities for the car catalog workspace.
//!
//! Provides the structured error body, resource path building, and time
//! conversion used by the api-server. Framework-agnostic.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;

/// Collection path of the car resource.
pub const CARS_PATH: &str = "/v1/cars";

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// Resource Paths
// ============================================================================

/// Canonical path of a single car, used for `Location` headers.
pub fn car_location(id: i64) -> String {
    format!("{}/{}", CARS_PATH, id)
}

// ============================================================================
// Time Utilities
// ============================================================================

/// Convert SystemTime to RFC3339 string (millisecond precision, UTC).
pub fn system_time_to_rfc3339(t: SystemTime) -> String {
    let dt: DateTime<Utc> = t.into();
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_json_err() {
        let err = json_err("not_found");
        assert_eq!(err, serde_json::json!({"error": {"code": "not_found", "message": "Resource not found"}}));

        // Unknown code falls back to code as message
        let err = json_err("custom_error");
        assert_eq!(err, serde_json::json!({"error": {"code": "custom_error", "message": "custom_error"}}));
    }

    #[test]
    fn test_json_error_with_message() {
        let err = json_error_with_message("bad_request", "make must not be blank");
        assert_eq!(
            err,
            serde_json::json!({"error": {"code": "bad_request", "message": "make must not be blank"}})
        );
    }

    #[test]
    fn test_car_location() {
        assert_eq!(car_location(1), "/v1/cars/1");
        assert_eq!(car_location(-3), "/v1/cars/-3");
        assert!(car_location(42).starts_with(CARS_PATH));
    }

    #[test]
    fn test_rfc3339_millis() {
        let t = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        let s = system_time_to_rfc3339(t);
        assert_eq!(s, "2023-11-14T22:13:20.123Z");
        let parsed: SystemTime = DateTime::parse_from_rfc3339(&s)
            .unwrap()
            .with_timezone(&Utc)
            .into();
        assert_eq!(parsed, t);
    }
}
