//! Payment ledger DTOs.

use bigdecimal::BigDecimal;
use jiff::civil;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::farmer::FarmerSummary;
use crate::models::{PaymentMethod, PaymentType};
use crate::repositories::{PaymentFilter, PaymentSortKey, Sort};
use crate::services::{
    DEFAULT_PAYMENT_SORT, PaymentInput, PaymentPatch, PaymentStats, PaymentView, TypeTotals,
    WindowTotals,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePaymentRequest {
    #[schema(example = 12)]
    pub farmer_id: i32,
    #[schema(value_type = String, example = "2500.00")]
    pub amount: BigDecimal,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Required for fines
    #[serde(default)]
    #[validate(length(max = 120, message = "Ensure this field has no more than 120 characters."))]
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2025-06-14")]
    pub date_paid: civil::Date,
    #[serde(default)]
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference_code: Option<String>,
    pub notes: Option<String>,
}

impl From<CreatePaymentRequest> for PaymentInput {
    fn from(request: CreatePaymentRequest) -> Self {
        PaymentInput {
            farmer_id: request.farmer_id,
            amount: request.amount,
            payment_type: request.payment_type,
            description: request.description,
            date_paid: request.date_paid,
            method: request.method,
            reference_code: request.reference_code,
            notes: request.notes,
        }
    }
}

/// Partial update. Verification state is changed only through `/verify/`.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdatePaymentRequest {
    pub farmer_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<BigDecimal>,
    pub payment_type: Option<PaymentType>,
    #[validate(length(max = 120, message = "Ensure this field has no more than 120 characters."))]
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_paid: Option<civil::Date>,
    pub method: Option<PaymentMethod>,
    #[validate(length(max = 100))]
    pub reference_code: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdatePaymentRequest> for PaymentPatch {
    fn from(request: UpdatePaymentRequest) -> Self {
        PaymentPatch {
            farmer_id: request.farmer_id,
            amount: request.amount,
            payment_type: request.payment_type,
            description: request.description,
            date_paid: request.date_paid,
            method: request.method,
            reference_code: request.reference_code,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub farmer: Option<FarmerSummary>,
    pub farmer_id: i32,
    /// The farmer's plots times their per-plot amount, as of now
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<BigDecimal>,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    pub description: String,
    #[schema(value_type = String, format = Date)]
    pub date_paid: civil::Date,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub recorded_by: Option<i32>,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: jiff::Timestamp,
    pub is_verified: bool,
    pub verified_by: Option<i32>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub verification_date: Option<jiff::Timestamp>,
    pub notes: Option<String>,
}

impl From<PaymentView> for PaymentResponse {
    fn from(view: PaymentView) -> Self {
        let total_amount = view.total_amount_due();
        let payment = view.payment;
        Self {
            id: payment.id,
            farmer: view.farmer.map(FarmerSummary::from),
            farmer_id: payment.farmer_id,
            total_amount,
            amount: payment.amount,
            payment_type: payment.payment_type,
            description: payment.description,
            date_paid: payment.date_paid.to_jiff(),
            method: payment.method,
            reference_code: payment.reference_code,
            recorded_by: payment.recorded_by,
            timestamp: payment.timestamp.to_jiff(),
            is_verified: payment.is_verified,
            verified_by: payment.verified_by,
            verification_date: payment.verification_date.map(|ts| ts.to_jiff()),
            notes: payment.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PaymentListQuery {
    pub farmer: Option<i32>,
    pub payment_type: Option<PaymentType>,
    pub method: Option<PaymentMethod>,
    pub is_verified: Option<bool>,
    #[param(value_type = Option<String>)]
    pub min_amount: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub max_amount: Option<BigDecimal>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_paid_after: Option<civil::Date>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_paid_before: Option<civil::Date>,
    /// Matches farmer names or reference code
    pub search: Option<String>,
    /// `date_paid`, `amount` or `timestamp`; prefix `-` to descend
    #[param(example = "-date_paid")]
    pub ordering: Option<String>,
}

impl PaymentListQuery {
    pub fn sort(&self) -> Sort<PaymentSortKey> {
        Sort::parse_or(self.ordering.as_deref(), DEFAULT_PAYMENT_SORT)
    }
}

impl From<PaymentListQuery> for PaymentFilter {
    fn from(query: PaymentListQuery) -> Self {
        PaymentFilter {
            farmer_id: query.farmer,
            payment_type: query.payment_type,
            method: query.method,
            is_verified: query.is_verified,
            min_amount: query.min_amount,
            max_amount: query.max_amount,
            paid_after: query.date_paid_after.map(Into::into),
            paid_before: query.date_paid_before.map(Into::into),
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WindowTotalsResponse {
    pub count: i64,
    /// Null when the window holds no payments
    #[schema(value_type = Option<String>)]
    pub sum: Option<BigDecimal>,
}

impl From<WindowTotals> for WindowTotalsResponse {
    fn from(totals: WindowTotals) -> Self {
        Self {
            count: totals.count,
            sum: totals.sum,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TypeTotalsResponse {
    pub payment_type: PaymentType,
    pub count: i64,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
}

impl From<TypeTotals> for TypeTotalsResponse {
    fn from(totals: TypeTotals) -> Self {
        Self {
            payment_type: totals.payment_type,
            count: totals.count,
            amount: totals.amount,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationStats {
    pub verified: i64,
    pub unverified: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentStatsResponse {
    pub total_payments: i64,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub today: WindowTotalsResponse,
    /// Last 7 days, today included
    pub last_week: WindowTotalsResponse,
    /// Last 30 days, today included
    pub last_month: WindowTotalsResponse,
    pub by_type: Vec<TypeTotalsResponse>,
    pub verification_stats: VerificationStats,
}

impl From<PaymentStats> for PaymentStatsResponse {
    fn from(stats: PaymentStats) -> Self {
        Self {
            total_payments: stats.total_payments,
            total_amount: stats.total_amount,
            today: stats.today.into(),
            last_week: stats.last_week.into(),
            last_month: stats.last_month.into(),
            by_type: stats.by_type.into_iter().map(Into::into).collect(),
            verification_stats: VerificationStats {
                verified: stats.verified,
                unverified: stats.unverified,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::Zero;
    use std::str::FromStr;

    #[test]
    fn test_create_defaults_type_and_method() {
        let request: CreatePaymentRequest = serde_json::from_str(
            r#"{"farmer_id":4,"amount":"150.25","date_paid":"2025-05-02"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let input = PaymentInput::from(request);
        assert_eq!(input.payment_type, PaymentType::PlotFee);
        assert_eq!(input.method, PaymentMethod::Cash);
        assert_eq!(input.amount, BigDecimal::from_str("150.25").unwrap());
        assert_eq!(input.description, "");
    }

    #[test]
    fn test_long_description_rejected() {
        let body = serde_json::json!({
            "farmer_id": 4,
            "amount": "10",
            "date_paid": "2025-05-02",
            "description": "x".repeat(121),
        });
        let request: CreatePaymentRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().unwrap_err().field_errors().contains_key("description"));
    }

    #[test]
    fn test_ordering_parses_amount() {
        let query = PaymentListQuery {
            ordering: Some("amount".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.sort(),
            Sort {
                key: PaymentSortKey::Amount,
                descending: false
            }
        );
        assert_eq!(PaymentListQuery::default().sort(), DEFAULT_PAYMENT_SORT);
    }

    #[test]
    fn test_stats_nest_verification_counts() {
        let stats = PaymentStats {
            total_payments: 3,
            total_amount: BigDecimal::from(600),
            today: WindowTotals::default(),
            last_week: WindowTotals {
                count: 1,
                sum: Some(BigDecimal::from(100)),
            },
            last_month: WindowTotals {
                count: 3,
                sum: Some(BigDecimal::from(600)),
            },
            by_type: vec![TypeTotals {
                payment_type: PaymentType::Fine,
                count: 3,
                amount: BigDecimal::from(600),
            }],
            verified: 2,
            unverified: 1,
        };
        let body = serde_json::to_value(PaymentStatsResponse::from(stats)).unwrap();

        assert_eq!(body["verification_stats"]["verified"], 2);
        assert_eq!(body["verification_stats"]["unverified"], 1);
        assert_eq!(body["today"]["count"], 0);
        assert!(body["today"]["sum"].is_null());
        assert_eq!(body["by_type"][0]["payment_type"], "fine");
        assert!(BigDecimal::from_str(body["total_amount"].as_str().unwrap()).unwrap() > BigDecimal::zero());
    }
}
