//! User account DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Role, Section, User};
use crate::services::UserPatch;

/// A user account (the password hash is never exposed).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_approved: bool,
    pub block: Option<i32>,
    pub section: Option<i32>,
    #[schema(value_type = String, format = DateTime)]
    pub date_joined: jiff::Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            is_approved: user.is_approved,
            block: user.block_id,
            section: user.section_id,
            date_joined: user.date_joined.to_jiff(),
        }
    }
}

/// Administrative update. Only the fields present are changed; `role` and
/// `is_approved` need the assign-roles capability. A `block_chair` role needs
/// both `block` and `section`; any other role clears them.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_approved: Option<bool>,
    pub block: Option<i32>,
    pub section: Option<i32>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(request: UpdateUserRequest) -> Self {
        UserPatch {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            role: request.role,
            is_approved: request.is_approved,
            block_id: request.block,
            section_id: request.section,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SectionsOfBlockQuery {
    /// Block whose sections are listed (required)
    pub block_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionOption {
    pub id: i32,
    pub name: String,
}

impl From<Section> for SectionOption {
    fn from(section: Section) -> Self {
        Self {
            id: section.id,
            name: section.name,
        }
    }
}
