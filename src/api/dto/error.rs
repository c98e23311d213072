//! Error response DTOs.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "code": "VALIDATION_ERROR",
    "message": "Validation failed for section: Selected section does not belong to the selected block.",
    "details": { "section": "Selected section does not belong to the selected block." },
    "request_id": "5f0c6a1e-8f5b-4f7e-9a55-3c1f6d0f2b11"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Field-keyed reasons for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "Farmer 7 not found")).unwrap();
        assert_eq!(body, json!({"code": "NOT_FOUND", "message": "Farmer 7 not found"}));
    }

    #[test]
    fn test_details_and_request_id() {
        let body = ErrorResponse::new("VALIDATION_ERROR", "Invalid")
            .with_details(json!({"phone_number": "Enter a valid phone number."}))
            .with_request_id("req-1");
        let value = serde_json::to_value(body).unwrap();

        assert_eq!(value["details"]["phone_number"], "Enter a valid phone number.");
        assert_eq!(value["request_id"], "req-1");
    }
}
