//! Payment ledger.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::access::Caller;
use crate::api::doc::PAYMENTS_TAG;
use crate::api::dto::{
    CreatePaymentRequest, ErrorResponse, PaymentListQuery, PaymentResponse, PaymentStatsResponse,
    UpdatePaymentRequest,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_payments, create_payment))
        .routes(routes!(payment_stats))
        .routes(routes!(get_payment, update_payment, delete_payment))
        .routes(routes!(verify_payment))
}

#[utoipa::path(
    get,
    path = "/api/payments/",
    tag = PAYMENTS_TAG,
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Payments in the caller's reach", body = Vec<PaymentResponse>)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_payments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedQuery(query): ValidatedQuery<PaymentListQuery>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let sort = query.sort();
    let payments = state
        .services
        .payments
        .list(&caller, &query.into(), sort)
        .await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

/// Records a payment; the caller is stamped as recorder.
#[utoipa::path(
    post,
    path = "/api/payments/",
    tag = PAYMENTS_TAG,
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid data", body = ErrorResponse),
        (status = 403, description = "Farmer outside the caller's block", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    let payment = state
        .services
        .payments
        .create(&caller, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}/",
    tag = PAYMENTS_TAG,
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment found", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state.services.payments.get(&caller, id).await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    put,
    path = "/api/payments/{id}/",
    tag = PAYMENTS_TAG,
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 400, description = "Invalid data", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdatePaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state
        .services
        .payments
        .update(&caller, id, payload.into())
        .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}/",
    tag = PAYMENTS_TAG,
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn delete_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.payments.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Marks a payment verified by the caller. A payment is verified once.
#[utoipa::path(
    post,
    path = "/api/payments/{id}/verify/",
    tag = PAYMENTS_TAG,
    params(
        ("id" = i32, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment verified", body = PaymentResponse),
        (status = 400, description = "Already verified", body = ErrorResponse),
        (status = 403, description = "Role may not verify payments", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn verify_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state.services.payments.verify(&caller, id).await?;
    Ok(Json(payment.into()))
}

/// Totals, rolling windows, per-type sums and verification counts.
#[utoipa::path(
    get,
    path = "/api/payments/stats/",
    tag = PAYMENTS_TAG,
    responses(
        (status = 200, description = "Payment figures", body = PaymentStatsResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn payment_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<PaymentStatsResponse>> {
    let stats = state.services.payments.stats(&caller).await?;
    Ok(Json(stats.into()))
}
