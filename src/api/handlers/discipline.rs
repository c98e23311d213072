//! Discipline cases.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::DISCIPLINE_TAG;
use crate::api::dto::{
    CaseListQuery, CaseResponse, CaseStatsResponse, CreateCaseRequest, ErrorResponse,
    ResolveCaseRequest, UpdateCaseRequest,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn discipline_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_cases, create_case))
        .routes(routes!(case_stats))
        .routes(routes!(get_case, update_case, delete_case))
        .routes(routes!(resolve_case))
}

#[utoipa::path(
    get,
    path = "/api/discipline/",
    tag = DISCIPLINE_TAG,
    params(CaseListQuery),
    responses(
        (status = 200, description = "Cases in the caller's reach", body = Vec<CaseResponse>)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_cases(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<CaseListQuery>,
) -> AppResult<Json<Vec<CaseResponse>>> {
    let sort = query.sort();
    let cases = state
        .services
        .discipline
        .list(&caller, &query.into(), sort)
        .await?;
    Ok(Json(cases.into_iter().map(CaseResponse::from).collect()))
}

/// Opens a case against a farmer. Block and section come from the farmer;
/// the caller is stamped as reporter.
#[utoipa::path(
    post,
    path = "/api/discipline/",
    tag = DISCIPLINE_TAG,
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case opened", body = CaseResponse),
        (status = 400, description = "Invalid data", body = ErrorResponse),
        (status = 403, description = "Farmer outside the caller's block", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_case(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateCaseRequest>,
) -> AppResult<(StatusCode, Json<CaseResponse>)> {
    let case = state
        .services
        .discipline
        .create(&caller, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(case.into())))
}

#[utoipa::path(
    get,
    path = "/api/discipline/{id}/",
    tag = DISCIPLINE_TAG,
    params(
        ("id" = i32, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 403, description = "Case outside the caller's block", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_case(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<Json<CaseResponse>> {
    let case = state.services.discipline.get(&caller, id).await?;
    Ok(Json(case.into()))
}

/// Partial update. Status changes must follow the case workflow.
#[utoipa::path(
    put,
    path = "/api/discipline/{id}/",
    tag = DISCIPLINE_TAG,
    params(
        ("id" = i32, Path, description = "Case ID")
    ),
    request_body = UpdateCaseRequest,
    responses(
        (status = 200, description = "Case updated", body = CaseResponse),
        (status = 400, description = "Invalid data or status change", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_case(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateCaseRequest>,
) -> AppResult<Json<CaseResponse>> {
    let case = state
        .services
        .discipline
        .update(&caller, id, payload.into())
        .await?;
    Ok(Json(case.into()))
}

#[utoipa::path(
    delete,
    path = "/api/discipline/{id}/",
    tag = DISCIPLINE_TAG,
    params(
        ("id" = i32, Path, description = "Case ID")
    ),
    responses(
        (status = 204, description = "Case deleted"),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn delete_case(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.discipline.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Closes a case with the action taken.
#[utoipa::path(
    post,
    path = "/api/discipline/{id}/resolve/",
    tag = DISCIPLINE_TAG,
    params(
        ("id" = i32, Path, description = "Case ID")
    ),
    request_body = ResolveCaseRequest,
    responses(
        (status = 200, description = "Case resolved", body = CaseResponse),
        (status = 400, description = "action_taken missing or case closed", body = ErrorResponse),
        (status = 403, description = "Role may not resolve cases", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn resolve_case(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ResolveCaseRequest>,
) -> AppResult<Json<CaseResponse>> {
    let case = state
        .services
        .discipline
        .resolve(&caller, id, payload.action_taken)
        .await?;
    Ok(Json(case.into()))
}

#[utoipa::path(
    get,
    path = "/api/discipline/stats/",
    tag = DISCIPLINE_TAG,
    responses(
        (status = 200, description = "Case counts", body = CaseStatsResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn case_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<CaseStatsResponse>> {
    let stats = state.services.discipline.stats(&caller).await?;
    Ok(Json(stats.into()))
}
