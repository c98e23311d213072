//! Registration, login and token refresh payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Role, User};
use crate::services::{Registration, Session};

pub const REGISTRATION_PENDING: &str = "Registration successful. Waiting for admin approval.";

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    #[schema(example = "chikondi", min_length = 3, max_length = 150)]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    #[schema(format = "password", min_length = 8)]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(format = "email")]
    pub email: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Registration {
            username: request.username.trim().to_string(),
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "Registration successful. Waiting for admin approval.")]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[schema(example = "chikondi")]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[schema(format = "password")]
    pub password: String,
}

/// The account summary returned with a fresh token pair.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_approved: bool,
    /// Assigned block id (block chairs only)
    pub block: Option<i32>,
    /// Assigned section id (block chairs only)
    pub section: Option<i32>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_approved: user.is_approved,
            block: user.block_id,
            section: user.section_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub refresh: String,
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub access: String,
    pub user: SessionUser,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            refresh: session.refresh,
            access: session.access,
            user: session.user.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub access: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn user() -> User {
        User {
            id: 4,
            username: "chair1".to_string(),
            password: "$argon2id$...".to_string(),
            first_name: "Tamanda".to_string(),
            last_name: "Phiri".to_string(),
            email: "t@example.com".to_string(),
            role: Role::BlockChair,
            is_approved: true,
            block_id: Some(2),
            section_id: Some(5),
            date_joined: Timestamp::UNIX_EPOCH.into(),
        }
    }

    #[test]
    fn test_login_response_shape() {
        let response = LoginResponse::from(Session {
            user: user(),
            access: "a".to_string(),
            refresh: "r".to_string(),
        });
        let value = serde_json::to_value(response).unwrap();

        assert_eq!(value["access"], "a");
        assert_eq!(value["refresh"], "r");
        assert_eq!(value["user"]["role"], "block_chair");
        assert_eq!(value["user"]["block"], 2);
        assert_eq!(value["user"]["section"], 5);
        assert!(value["user"].get("password").is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"username":"ab","password":"short","email":"not-an-email"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_registration_trims_username_and_defaults_email() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"username":"  farmer7 ","password":"longenough"}"#).unwrap();
        let registration = Registration::from(request);

        assert_eq!(registration.username, "farmer7");
        assert_eq!(registration.email, "");
    }
}
