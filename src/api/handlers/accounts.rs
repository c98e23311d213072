//! Registration, login, token refresh and user administration.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::ACCOUNTS_TAG;
use crate::api::dto::{
    ErrorResponse, LoginRequest, LoginResponse, REGISTRATION_PENDING, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest, RegisterResponse, SectionOption, SectionsOfBlockQuery,
    UpdateUserRequest, UserResponse,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

/// Routes that need no token.
///
/// - `POST /api/accounts/register/`
/// - `POST /api/accounts/login/`
/// - `POST /api/accounts/token/refresh/`
pub fn public_account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(refresh_token))
}

/// Routes open to any signed-in account, farmers included.
pub fn member_account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(profile))
        .routes(routes!(filtered_sections))
}

/// User administration.
pub fn user_admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user, update_user))
}

/// Creates an unapproved farmer account; an administrator approves it later.
#[utoipa::path(
    post,
    path = "/api/accounts/register/",
    tag = ACCOUNTS_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, awaiting approval", body = RegisterResponse),
        (status = 400, description = "Invalid data or username taken", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    state.services.accounts.register(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: REGISTRATION_PENDING.to_string(),
        }),
    ))
}

/// Exchanges credentials of an approved account for a token pair.
#[utoipa::path(
    post,
    path = "/api/accounts/login/",
    tag = ACCOUNTS_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or account not approved", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state
        .services
        .accounts
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/api/accounts/token/refresh/",
    tag = ACCOUNTS_TAG,
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshTokenResponse),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorResponse)
    )
)]
async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<Json<RefreshTokenResponse>> {
    let access = state.services.accounts.refresh(&payload.refresh).await?;
    Ok(Json(RefreshTokenResponse { access }))
}

/// The signed-in account.
#[utoipa::path(
    get,
    path = "/api/accounts/profile/",
    tag = ACCOUNTS_TAG,
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.accounts.profile(&caller).await?;
    Ok(Json(user.into()))
}

/// Sections of one block, for assignment forms.
#[utoipa::path(
    get,
    path = "/api/accounts/filtered-sections/",
    tag = ACCOUNTS_TAG,
    params(SectionsOfBlockQuery),
    responses(
        (status = 200, description = "Sections of the block", body = Vec<SectionOption>),
        (status = 400, description = "block_id missing", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn filtered_sections(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SectionsOfBlockQuery>,
) -> AppResult<Json<Vec<SectionOption>>> {
    let sections = state
        .services
        .accounts
        .sections_of_block(query.block_id)
        .await?;
    Ok(Json(sections.into_iter().map(SectionOption::from).collect()))
}

/// Every account, most recently joined first.
#[utoipa::path(
    get,
    path = "/api/accounts/users/",
    tag = ACCOUNTS_TAG,
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 403, description = "Not staff", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.services.accounts.list_users(&caller).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/accounts/users/{id}/",
    tag = ACCOUNTS_TAG,
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.accounts.get_user(&caller, id).await?;
    Ok(Json(user.into()))
}

/// Changes profile fields, role, approval or block assignment.
#[utoipa::path(
    patch,
    path = "/api/accounts/users/{id}/",
    tag = ACCOUNTS_TAG,
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid assignment", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .accounts
        .update_user(&caller, id, payload.into())
        .await?;
    Ok(Json(user.into()))
}
