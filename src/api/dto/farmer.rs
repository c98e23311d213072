//! Farmer registry DTOs.

use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::models::{FarmerRole, Gender};
use crate::repositories::FarmerFilter;
use crate::services::{FarmerInput, FarmerPatch, FarmerView};

static PHONE_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?1?\d{9,15}$").ok());

const PHONE_MESSAGE: &str =
    "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed.";

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    match PHONE_NUMBER.as_ref() {
        Some(pattern) if pattern.is_match(phone) => Ok(()),
        _ => Err(ValidationError::new("phone_number").with_message(PHONE_MESSAGE.into())),
    }
}

/// Registers a farmer. Any `total_amount` sent is ignored and recomputed.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFarmerRequest {
    #[validate(length(min = 1, max = 100, message = "This field may not be blank."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "This field may not be blank."))]
    pub last_name: String,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    pub gender: Gender,
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+265888123456")]
    pub phone_number: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    #[schema(example = 2)]
    pub number_of_plots: i32,
    #[schema(value_type = String, example = "15000.00")]
    pub amount_per_plot: BigDecimal,
    pub location: i32,
    pub block: i32,
    pub section: i32,
    #[serde(default = "default_farmer_role")]
    pub role: FarmerRole,
    #[validate(length(max = 200))]
    pub next_of_kin: Option<String>,
}

fn default_farmer_role() -> FarmerRole {
    FarmerRole::Farmer
}

impl From<CreateFarmerRequest> for FarmerInput {
    fn from(request: CreateFarmerRequest) -> Self {
        FarmerInput {
            first_name: request.first_name,
            last_name: request.last_name,
            middle_name: request.middle_name,
            gender: request.gender,
            phone_number: request.phone_number,
            email: request.email,
            number_of_plots: request.number_of_plots,
            amount_per_plot: request.amount_per_plot,
            location_id: request.location,
            block_id: request.block,
            section_id: request.section,
            role: request.role,
            next_of_kin: request.next_of_kin,
        }
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateFarmerRequest {
    #[validate(length(min = 1, max = 100, message = "This field may not be blank."))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "This field may not be blank."))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    pub gender: Option<Gender>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub number_of_plots: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub amount_per_plot: Option<BigDecimal>,
    pub location: Option<i32>,
    pub block: Option<i32>,
    pub section: Option<i32>,
    pub role: Option<FarmerRole>,
    #[validate(length(max = 200))]
    pub next_of_kin: Option<String>,
}

impl From<UpdateFarmerRequest> for FarmerPatch {
    fn from(request: UpdateFarmerRequest) -> Self {
        FarmerPatch {
            first_name: request.first_name,
            last_name: request.last_name,
            middle_name: request.middle_name,
            gender: request.gender,
            phone_number: request.phone_number,
            email: request.email,
            number_of_plots: request.number_of_plots,
            amount_per_plot: request.amount_per_plot,
            location_id: request.location,
            block_id: request.block,
            section_id: request.section,
            role: request.role,
            next_of_kin: request.next_of_kin,
        }
    }
}

/// Farmer listing filters. `block` and `block_id` are synonyms.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct FarmerListQuery {
    pub block: Option<i32>,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub location_id: Option<i32>,
    /// Matches first/last name, phone number or registration number
    pub search: Option<String>,
}

impl From<FarmerListQuery> for FarmerFilter {
    fn from(query: FarmerListQuery) -> Self {
        FarmerFilter {
            block_id: query.block.or(query.block_id),
            section_id: query.section_id,
            location_id: query.location_id,
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FarmerResponse {
    pub id: i32,
    #[schema(example = "LRS00001")]
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub phone_number: String,
    pub email: Option<String>,
    pub number_of_plots: i32,
    #[schema(value_type = String)]
    pub amount_per_plot: BigDecimal,
    /// Always `number_of_plots × amount_per_plot`
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub location: i32,
    pub location_name: Option<String>,
    pub block: i32,
    pub block_name: Option<String>,
    pub section: i32,
    pub section_name: Option<String>,
    pub role: FarmerRole,
    pub next_of_kin: Option<String>,
    pub is_active: bool,
    #[schema(value_type = String, format = DateTime)]
    pub date_registered: jiff::Timestamp,
}

impl From<FarmerView> for FarmerResponse {
    fn from(view: FarmerView) -> Self {
        let farmer = view.farmer;
        Self {
            id: farmer.id,
            registration_number: farmer.registration_number,
            first_name: farmer.first_name,
            last_name: farmer.last_name,
            middle_name: farmer.middle_name,
            gender: farmer.gender,
            phone_number: farmer.phone_number,
            email: farmer.email,
            number_of_plots: farmer.number_of_plots,
            amount_per_plot: farmer.amount_per_plot,
            total_amount: farmer.total_amount,
            location: farmer.location_id,
            location_name: view.location_name,
            block: farmer.block_id,
            block_name: view.block_name,
            section: farmer.section_id,
            section_name: view.section_name,
            role: farmer.role,
            next_of_kin: farmer.next_of_kin,
            is_active: farmer.is_active,
            date_registered: farmer.date_registered.to_jiff(),
        }
    }
}

/// Compact farmer reference embedded in payment responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct FarmerSummary {
    pub id: i32,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub block: i32,
    pub section: i32,
}

impl From<crate::models::Farmer> for FarmerSummary {
    fn from(farmer: crate::models::Farmer) -> Self {
        Self {
            id: farmer.id,
            registration_number: farmer.registration_number,
            first_name: farmer.first_name,
            last_name: farmer.last_name,
            block: farmer.block_id,
            section: farmer.section_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const VALID: &str = r#"{
        "first_name": "Chisomo",
        "last_name": "Mwale",
        "gender": "male",
        "phone_number": "+265888000111",
        "number_of_plots": 3,
        "amount_per_plot": "2500.50",
        "total_amount": "1.00",
        "location": 1,
        "block": 2,
        "section": 3
    }"#;

    #[test]
    fn test_client_total_is_dropped() {
        let request: CreateFarmerRequest = serde_json::from_str(VALID).unwrap();
        assert!(request.validate().is_ok());

        let input = FarmerInput::from(request);
        assert_eq!(input.role, FarmerRole::Farmer);
        assert_eq!(input.amount_per_plot, BigDecimal::from_str("2500.50").unwrap());
        assert_eq!((input.location_id, input.block_id, input.section_id), (1, 2, 3));
    }

    #[test]
    fn test_phone_number_pattern() {
        for good in ["+265888000111", "0888000111", "123456789"] {
            assert!(validate_phone(good).is_ok(), "{good}");
        }
        for bad in ["12345678", "+26588800011122233", "0888-000-111", ""] {
            assert!(validate_phone(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_invalid_phone_is_reported_on_field() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["phone_number"] = "call me".into();
        let request: CreateFarmerRequest = serde_json::from_value(value).unwrap();

        let errors = request.validate().unwrap_err();
        let phone = &errors.field_errors()["phone_number"];
        assert_eq!(phone[0].message.as_deref(), Some(PHONE_MESSAGE));
    }

    #[test]
    fn test_zero_plots_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["number_of_plots"] = 0.into();
        let request: CreateFarmerRequest = serde_json::from_value(value).unwrap();

        assert!(request.validate().unwrap_err().field_errors().contains_key("number_of_plots"));
    }

    #[test]
    fn test_list_query_prefers_block_over_block_id() {
        let query = FarmerListQuery {
            block: Some(4),
            block_id: Some(9),
            search: Some("  ".to_string()),
            ..Default::default()
        };
        let filter = FarmerFilter::from(query);

        assert_eq!(filter.block_id, Some(4));
        assert!(filter.search.is_none());
    }
}
