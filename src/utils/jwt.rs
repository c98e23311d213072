use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent as `Authorization: Bearer`.
    Access,
    /// Long-lived token exchanged at `/accounts/token/refresh/`.
    Refresh,
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub token_type: TokenType,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: i32,
        username: String,
        role: Role,
        token_type: TokenType,
        lifetime: SignedDuration,
    ) -> Self {
        let now = Timestamp::now();
        let exp = now.as_second().saturating_add(lifetime.as_secs());

        Self {
            sub: user_id.to_string(),
            username,
            role,
            token_type,
            iat: now.as_second(),
            exp,
        }
    }

    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject"))
    }
}

/// Lifetimes and secret used to issue a token pair.
#[derive(Debug, Clone)]
pub struct TokenIssuer<'a> {
    pub secret: &'a str,
    pub access_lifetime: SignedDuration,
    pub refresh_lifetime: SignedDuration,
}

pub fn generate_token(
    user_id: i32,
    username: String,
    role: Role,
    token_type: TokenType,
    secret: &str,
    lifetime: SignedDuration,
) -> AppResult<String> {
    let claims = Claims::new(user_id, username, role, token_type, lifetime);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Generates `(access, refresh)` for a user.
pub fn generate_token_pair(
    user_id: i32,
    username: &str,
    role: Role,
    issuer: &TokenIssuer<'_>,
) -> AppResult<(String, String)> {
    let access_token = generate_token(
        user_id,
        username.to_string(),
        role,
        TokenType::Access,
        issuer.secret,
        issuer.access_lifetime,
    )?;
    let refresh_token = generate_token(
        user_id,
        username.to_string(),
        role,
        TokenType::Refresh,
        issuer.secret,
        issuer.refresh_lifetime,
    )?;

    Ok((access_token, refresh_token))
}

/// Validates and decodes a JWT token, checking its type when `expected_type` is set.
pub fn validate_token(
    token: &str,
    secret: &str,
    expected_type: Option<TokenType>,
) -> AppResult<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::unauthorized("Token has expired")
            }
            jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::unauthorized("Invalid token"),
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AppError::unauthorized("Invalid token signature")
            }
            _ => AppError::unauthorized(format!("Token validation failed: {}", e)),
        })?;

    if let Some(expected) = expected_type
        && claims.token_type != expected
    {
        return Err(AppError::unauthorized(format!(
            "Invalid token type: expected {:?}, got {:?}",
            expected, claims.token_type
        )));
    }

    Ok(claims)
}

pub fn validate_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    validate_token(token, secret, Some(TokenType::Access))
}

pub fn validate_refresh_token(token: &str, secret: &str) -> AppResult<Claims> {
    validate_token(token, secret, Some(TokenType::Refresh))
}
