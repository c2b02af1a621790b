//! The uniform `{ success, summary, details }` wrapper returned by every API route.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope.
/// `details` carries the parsed upstream body on success and the raw upstream
/// error body on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(summary: impl Into<String>, details: T) -> Self {
        Self {
            success: true,
            summary: summary.into(),
            details: Some(details),
        }
    }

    pub fn failure(summary: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: summary.into(),
            details: None,
        }
    }

    pub fn failure_with(summary: impl Into<String>, details: T) -> Self {
        Self {
            success: false,
            summary: summary.into(),
            details: Some(details),
        }
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ApiResponse;

    #[test]
    fn test_failure_omits_details() {
        let res: ApiResponse = ApiResponse::failure("Not found");
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({"success": false, "summary": "Not found"})
        );
    }

    #[test]
    fn test_success_carries_details() {
        let res = ApiResponse::success("Token issued", json!({"token": "abc"}));
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({"success": true, "summary": "Token issued", "details": {"token": "abc"}})
        );
    }
}
