//! Accounts: registration, login, token refresh and user administration.

use crate::access::{Caller, Capability};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, Section, UpdateUser, User};
use crate::repositories::{OrgRepository, UserRepository};
use crate::utils::jwt::{
    TokenIssuer, TokenType, generate_token, generate_token_pair, validate_access_token,
    validate_refresh_token,
};
use crate::utils::password::{hash_password, verify_password};

/// Returned for every failed login so approval state is never disclosed.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials or account not approved";
pub const CHAIR_NEEDS_PLACEMENT: &str = "Block and section are required for block chairs.";
pub const INVALID_PLACEMENT: &str = "Invalid block or section ID.";

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Fields an administrator may change on a user. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_approved: Option<bool>,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
}

impl UserPatch {
    fn touches_authority(&self) -> bool {
        self.role.is_some() || self.is_approved.is_some()
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    orgs: OrgRepository,
    jwt: JwtConfig,
}

impl AccountService {
    pub fn new(users: UserRepository, orgs: OrgRepository, jwt: JwtConfig) -> Self {
        Self { users, orgs, jwt }
    }

    /// Creates an unapproved farmer account.
    pub async fn register(&self, form: Registration) -> AppResult<User> {
        let new_user = NewUser {
            password: hash_password(&form.password)?,
            username: form.username,
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            role: Role::Farmer,
            is_approved: false,
        };

        let user = self.users.create(new_user).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Account registered, awaiting approval");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let candidate = self.users.find_by_username(username).await?;
        let user = accept_login(candidate, password).inspect_err(|_| {
            tracing::warn!(username = %username, "Login rejected");
        })?;

        let (access, refresh) =
            generate_token_pair(user.id, &user.username, user.role, &self.issuer())?;
        tracing::info!(user_id = user.id, role = %user.role, "Login succeeded");

        Ok(Session {
            user,
            access,
            refresh,
        })
    }

    /// Exchanges a refresh token for a new access token. The account must
    /// still exist and be approved.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = validate_refresh_token(refresh_token, &self.jwt.secret)?;
        let user = self.active_user(claims.user_id()?).await?;

        generate_token(
            user.id,
            user.username,
            user.role,
            TokenType::Access,
            &self.jwt.secret,
            self.jwt.access_lifetime(),
        )
    }

    /// Resolves a bearer token to the caller it acts as, reading role and
    /// assignment from storage rather than from the token.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<Caller> {
        let claims = validate_access_token(access_token, &self.jwt.secret)?;
        let user = self.active_user(claims.user_id()?).await?;
        Ok(Caller::from(&user))
    }

    pub async fn profile(&self, caller: &Caller) -> AppResult<User> {
        self.find_user(caller.user_id).await
    }

    /// Every account, most recently joined first.
    pub async fn list_users(&self, caller: &Caller) -> AppResult<Vec<User>> {
        caller.require(Capability::AdministrativeAccess)?;
        self.users.list_newest_first().await
    }

    pub async fn get_user(&self, caller: &Caller, user_id: i32) -> AppResult<User> {
        caller.require(Capability::ManageUsers)?;
        self.find_user(user_id).await
    }

    /// Applies an administrator's changes. A block chair keeps a validated
    /// block and section and becomes that block's designated chair; every
    /// other role has both cleared.
    pub async fn update_user(
        &self,
        caller: &Caller,
        user_id: i32,
        patch: UserPatch,
    ) -> AppResult<User> {
        caller.require(Capability::ManageUsers)?;
        if patch.touches_authority() && !caller.can(Capability::AssignRoles) {
            return Err(AppError::forbidden(
                "You don't have permission to change roles or approval status.",
            ));
        }

        let user = self.find_user(user_id).await?;
        let role = patch.role.unwrap_or(user.role);
        let (block_id, section_id) = resolve_assignment(role, patch.block_id, patch.section_id)?;
        if let (Some(block_id), Some(section_id)) = (block_id, section_id) {
            self.check_placement(block_id, section_id).await?;
        }

        let update = UpdateUser {
            first_name: patch.first_name,
            last_name: patch.last_name,
            email: patch.email,
            role: patch.role,
            is_approved: patch.is_approved,
            block_id: Some(block_id),
            section_id: Some(section_id),
        };

        let updated = self.users.update_with_assignment(user_id, update).await?;
        tracing::info!(
            actor = caller.user_id,
            user_id = updated.id,
            role = %updated.role,
            is_approved = updated.is_approved,
            "User updated"
        );
        Ok(updated)
    }

    /// Sections of one block, for the registration and assignment forms.
    pub async fn sections_of_block(&self, block_id: Option<i32>) -> AppResult<Vec<Section>> {
        let block_id = block_id.ok_or_else(|| AppError::bad_request("block_id is required"))?;
        let sections = self.orgs.list_sections(Some(block_id)).await?;
        Ok(sections.into_iter().map(|(section, _)| section).collect())
    }

    async fn find_user(&self, user_id: i32) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", user_id))
    }

    async fn active_user(&self, user_id: i32) -> AppResult<User> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_approved => Ok(user),
            _ => Err(AppError::unauthorized("User not found or not approved")),
        }
    }

    async fn check_placement(&self, block_id: i32, section_id: i32) -> AppResult<()> {
        let block = self.orgs.find_block(block_id).await?;
        let section = self.orgs.find_section(section_id).await?;
        match (block, section) {
            (Some(_), Some(section)) if section.block_id == block_id => Ok(()),
            (Some(_), Some(_)) => Err(AppError::bad_request(
                "Section does not belong to the selected block.",
            )),
            _ => Err(AppError::bad_request(INVALID_PLACEMENT)),
        }
    }

    fn issuer(&self) -> TokenIssuer<'_> {
        TokenIssuer {
            secret: &self.jwt.secret,
            access_lifetime: self.jwt.access_lifetime(),
            refresh_lifetime: self.jwt.refresh_lifetime(),
        }
    }
}

/// Accepts the user only if they exist, the password matches and the account
/// is approved. Every failure carries the same message.
pub fn accept_login(candidate: Option<User>, password: &str) -> AppResult<User> {
    match candidate {
        Some(user) if user.is_approved && verify_password(password, &user.password) => Ok(user),
        _ => Err(AppError::unauthorized(INVALID_CREDENTIALS)),
    }
}

/// The block and section a user of `role` ends up with.
pub fn resolve_assignment(
    role: Role,
    block_id: Option<i32>,
    section_id: Option<i32>,
) -> AppResult<(Option<i32>, Option<i32>)> {
    if role != Role::BlockChair {
        return Ok((None, None));
    }
    match (block_id, section_id) {
        (Some(block_id), Some(section_id)) => Ok((Some(block_id), Some(section_id))),
        _ => Err(AppError::bad_request(CHAIR_NEEDS_PLACEMENT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn user(is_approved: bool, password: &str) -> User {
        User {
            id: 3,
            username: "tamanda".to_string(),
            password: hash_password(password).unwrap(),
            first_name: "Tamanda".to_string(),
            last_name: "Phiri".to_string(),
            email: String::new(),
            role: Role::Farmer,
            is_approved,
            block_id: None,
            section_id: None,
            date_joined: Timestamp::UNIX_EPOCH.into(),
        }
    }

    fn assert_invalid_credentials(result: AppResult<User>) {
        match result {
            Err(AppError::Unauthorized { message }) => assert_eq!(message, INVALID_CREDENTIALS),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|u| u.id)),
        }
    }

    #[test]
    fn test_approved_user_with_right_password_logs_in() {
        let accepted = accept_login(Some(user(true, "correct-horse")), "correct-horse").unwrap();
        assert_eq!(accepted.id, 3);
    }

    #[test]
    fn test_unapproved_user_gets_generic_rejection() {
        assert_invalid_credentials(accept_login(Some(user(false, "correct-horse")), "correct-horse"));
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        assert_invalid_credentials(accept_login(Some(user(true, "correct-horse")), "battery"));
        assert_invalid_credentials(accept_login(None, "anything"));
    }

    #[test]
    fn test_block_chair_requires_block_and_section() {
        assert_eq!(
            resolve_assignment(Role::BlockChair, Some(1), Some(2)).unwrap(),
            (Some(1), Some(2))
        );
        for (block, section) in [(Some(1), None), (None, Some(2)), (None, None)] {
            match resolve_assignment(Role::BlockChair, block, section) {
                Err(AppError::BadRequest { message }) => assert_eq!(message, CHAIR_NEEDS_PLACEMENT),
                other => panic!("Expected BadRequest, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_other_roles_have_assignment_cleared() {
        for role in [Role::Farmer, Role::Admin, Role::Treasurer, Role::President, Role::Secretary] {
            assert_eq!(resolve_assignment(role, Some(1), Some(2)).unwrap(), (None, None));
        }
    }

    #[test]
    fn test_patch_authority_fields() {
        assert!(!UserPatch::default().touches_authority());
        assert!(UserPatch { is_approved: Some(true), ..Default::default() }.touches_authority());
        assert!(UserPatch { role: Some(Role::Admin), ..Default::default() }.touches_authority());
    }
}
