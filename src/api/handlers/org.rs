//! Locations, blocks and sections.

use axum::{Extension, Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::ORG_TAG;
use crate::api::dto::{
    BlockResponse, CreateBlockRequest, CreateLocationRequest, CreateSectionRequest, ErrorResponse,
    LocationResponse, SectionListQuery, SectionResponse,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn org_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_locations, create_location))
        .routes(routes!(list_blocks, create_block))
        .routes(routes!(list_sections, create_section))
}

#[utoipa::path(
    get,
    path = "/api/farmers/locations/",
    tag = ORG_TAG,
    responses(
        (status = 200, description = "All locations", body = Vec<LocationResponse>)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_locations(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<LocationResponse>>> {
    let locations = state.services.orgs.list_locations(&caller).await?;
    Ok(Json(locations.into_iter().map(LocationResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/farmers/locations/",
    tag = ORG_TAG,
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid or duplicate name", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_location(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<LocationResponse>)> {
    let location = state
        .services
        .orgs
        .create_location(&caller, payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

#[utoipa::path(
    get,
    path = "/api/farmers/blocks/",
    tag = ORG_TAG,
    responses(
        (status = 200, description = "All blocks", body = Vec<BlockResponse>)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_blocks(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<BlockResponse>>> {
    let blocks = state.services.orgs.list_blocks(&caller).await?;
    Ok(Json(blocks.into_iter().map(BlockResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/farmers/blocks/",
    tag = ORG_TAG,
    request_body = CreateBlockRequest,
    responses(
        (status = 201, description = "Block created", body = BlockResponse),
        (status = 400, description = "Invalid or duplicate name", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_block(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateBlockRequest>,
) -> AppResult<(StatusCode, Json<BlockResponse>)> {
    let block = state.services.orgs.create_block(&caller, payload.name).await?;
    Ok((StatusCode::CREATED, Json(block.into())))
}

/// Sections with their block's name, optionally for one block.
#[utoipa::path(
    get,
    path = "/api/farmers/sections/",
    tag = ORG_TAG,
    params(SectionListQuery),
    responses(
        (status = 200, description = "Sections", body = Vec<SectionResponse>)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_sections(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<SectionListQuery>,
) -> AppResult<Json<Vec<SectionResponse>>> {
    let sections = state
        .services
        .orgs
        .list_sections(&caller, query.block_id)
        .await?;
    Ok(Json(sections.into_iter().map(SectionResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/farmers/sections/",
    tag = ORG_TAG,
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionResponse),
        (status = 400, description = "Invalid name or block", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_section(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateSectionRequest>,
) -> AppResult<(StatusCode, Json<SectionResponse>)> {
    let section = state
        .services
        .orgs
        .create_section(&caller, payload.name, payload.block)
        .await?;
    Ok((StatusCode::CREATED, Json(section.into())))
}
