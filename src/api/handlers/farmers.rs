//! Farmer registry and the dashboard rollup.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::FARMERS_TAG;
use crate::api::dto::{
    CreateFarmerRequest, DashboardResponse, ErrorResponse, FarmerListQuery, FarmerResponse,
    PagedResponse, PaginationParams, UpdateFarmerRequest,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn farmer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_farmers, create_farmer))
        .routes(routes!(get_farmer, update_farmer, delete_farmer))
        .routes(routes!(dashboard_stats))
}

/// Active farmers in the caller's reach, ten per page by default.
#[utoipa::path(
    get,
    path = "/api/farmers/farmers/",
    tag = FARMERS_TAG,
    params(FarmerListQuery, PaginationParams),
    responses(
        (status = 200, description = "A page of farmers", body = PagedResponse<FarmerResponse>),
        (status = 403, description = "Not staff", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_farmers(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<FarmerListQuery>,
    ValidatedQuery(pagination): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<FarmerResponse>>> {
    let pagination = pagination.normalize();
    let (farmers, total) = state
        .services
        .farmers
        .list(
            &caller,
            &query.into(),
            pagination.offset(),
            pagination.limit(),
        )
        .await?;

    let data = farmers.into_iter().map(FarmerResponse::from).collect();
    let total = u64::try_from(total).unwrap_or_default();
    Ok(Json(PagedResponse::new(data, &pagination, total)))
}

/// Registers a farmer. The registration number is assigned here.
#[utoipa::path(
    post,
    path = "/api/farmers/farmers/",
    tag = FARMERS_TAG,
    request_body = CreateFarmerRequest,
    responses(
        (status = 201, description = "Farmer registered", body = FarmerResponse),
        (status = 400, description = "Invalid data or placement", body = ErrorResponse),
        (status = 403, description = "Outside the caller's block", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_farmer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateFarmerRequest>,
) -> AppResult<(StatusCode, Json<FarmerResponse>)> {
    let farmer = state.services.farmers.create(&caller, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(farmer.into())))
}

#[utoipa::path(
    get,
    path = "/api/farmers/farmers/{id}/",
    tag = FARMERS_TAG,
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Farmer found", body = FarmerResponse),
        (status = 404, description = "Farmer not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_farmer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<Json<FarmerResponse>> {
    let farmer = state.services.farmers.get(&caller, id).await?;
    Ok(Json(farmer.into()))
}

/// Partial update; the total is recomputed from plots and rate.
#[utoipa::path(
    put,
    path = "/api/farmers/farmers/{id}/",
    tag = FARMERS_TAG,
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    request_body = UpdateFarmerRequest,
    responses(
        (status = 200, description = "Farmer updated", body = FarmerResponse),
        (status = 400, description = "Invalid data or placement", body = ErrorResponse),
        (status = 404, description = "Farmer not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_farmer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateFarmerRequest>,
) -> AppResult<Json<FarmerResponse>> {
    let farmer = state
        .services
        .farmers
        .update(&caller, id, payload.into())
        .await?;
    Ok(Json(farmer.into()))
}

/// Soft delete: the farmer is marked inactive and drops out of listings.
#[utoipa::path(
    delete,
    path = "/api/farmers/farmers/{id}/",
    tag = FARMERS_TAG,
    params(
        ("id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 204, description = "Farmer deactivated"),
        (status = 404, description = "Farmer not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn delete_farmer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.farmers.deactivate(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Headcount, today's attendance rate, fines, plots per section and the
/// largest outstanding balances.
#[utoipa::path(
    get,
    path = "/api/farmers/dashboard/stats/",
    tag = FARMERS_TAG,
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<DashboardResponse>> {
    let stats = state.services.reports.dashboard(&caller).await?;
    Ok(Json(stats.into()))
}
