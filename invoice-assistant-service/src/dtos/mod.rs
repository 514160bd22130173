use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConversationRequest {
    #[validate(
        required(message = "message not provided"),
        length(min = 1, message = "message not provided")
    )]
    pub message: Option<String>,

    /// Absent selects the tenant's default session. An empty string is a
    /// session of its own.
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DraftRequest {
    #[validate(
        required(message = "Description prompt is required"),
        length(min = 1, message = "Description prompt is required")
    )]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreatedResponse {
    pub message: String,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_message_fails_validation() {
        let missing: ConversationRequest = serde_json::from_str("{}").unwrap();
        assert!(missing.validate().is_err());

        let empty: ConversationRequest = serde_json::from_str(r#"{"message": ""}"#).unwrap();
        assert!(empty.validate().is_err());

        let ok: ConversationRequest =
            serde_json::from_str(r#"{"message": "Invoice Acme", "session_id": "s1"}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn profile_response_uses_camel_case() {
        let body = serde_json::to_value(ProfileCreatedResponse {
            message: "Profile created successfully".to_string(),
            user_id: "sub123".to_string(),
        })
        .unwrap();
        assert_eq!(body["userId"], "sub123");
    }
}
