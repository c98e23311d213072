//! Attendance ledger.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::ATTENDANCE_TAG;
use crate::api::dto::{
    AttendanceListQuery, AttendanceResponse, AttendanceStatsQuery, AttendanceStatsResponse,
    BlockAttendanceQuery, CreateAttendanceRequest, ErrorResponse, PenaltyResetResponse,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn attendance_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_attendance, record_attendance))
        .routes(routes!(block_attendance))
        .routes(routes!(attendance_stats))
        .routes(routes!(reset_penalties))
}

/// Records within the caller's block and section, newest first.
#[utoipa::path(
    get,
    path = "/api/attendance/",
    tag = ATTENDANCE_TAG,
    params(AttendanceListQuery),
    responses(
        (status = 200, description = "Attendance records", body = Vec<AttendanceResponse>),
        (status = 403, description = "Role may not list attendance", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<AttendanceListQuery>,
) -> AppResult<Json<Vec<AttendanceResponse>>> {
    let records = state
        .services
        .attendance
        .list(&caller, &query.into())
        .await?;
    Ok(Json(records.into_iter().map(AttendanceResponse::from).collect()))
}

/// Records attendance; the caller is stamped as recorder.
#[utoipa::path(
    post,
    path = "/api/attendance/",
    tag = ATTENDANCE_TAG,
    request_body = CreateAttendanceRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceResponse),
        (status = 400, description = "Invalid data", body = ErrorResponse),
        (status = 403, description = "Outside the caller's block or section", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn record_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreateAttendanceRequest>,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let record = state
        .services
        .attendance
        .record(&caller, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// A block chair's own block, optionally restricted to today.
#[utoipa::path(
    get,
    path = "/api/attendance/block/{block_id}/",
    tag = ATTENDANCE_TAG,
    params(
        ("block_id" = i32, Path, description = "Block ID"),
        BlockAttendanceQuery
    ),
    responses(
        (status = 200, description = "Attendance for the block", body = Vec<AttendanceResponse>),
        (status = 403, description = "Not the chair of this block", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn block_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(block_id): Path<i32>,
    ValidatedQuery(query): ValidatedQuery<BlockAttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceResponse>>> {
    let records = state
        .services
        .attendance
        .list_for_block(&caller, block_id, query.today.unwrap_or(false))
        .await?;
    Ok(Json(records.into_iter().map(AttendanceResponse::from).collect()))
}

/// Counts per status, for one block or all of them.
#[utoipa::path(
    get,
    path = "/api/attendance/stats/",
    tag = ATTENDANCE_TAG,
    params(AttendanceStatsQuery),
    responses(
        (status = 200, description = "Counts by status", body = AttendanceStatsResponse),
        (status = 400, description = "Block chair without a block", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn attendance_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<AttendanceStatsQuery>,
) -> AppResult<Json<AttendanceStatsResponse>> {
    let stats = state
        .services
        .attendance
        .stats(&caller, query.block_id)
        .await?;
    Ok(Json(stats.into()))
}

/// Zeroes the penalty points on every record of the farmer.
#[utoipa::path(
    post,
    path = "/api/attendance/penalties/reset/{farmer_id}/",
    tag = ATTENDANCE_TAG,
    params(
        ("farmer_id" = i32, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Penalties reset", body = PenaltyResetResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Farmer not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn reset_penalties(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(farmer_id): Path<i32>,
) -> AppResult<Json<PenaltyResetResponse>> {
    state
        .services
        .attendance
        .reset_penalties(&caller, farmer_id)
        .await?;
    Ok(Json(PenaltyResetResponse::for_farmer(farmer_id)))
}
