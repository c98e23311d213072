//! Farmer registry models.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::models::{FarmerRole, Gender};

/// Prefix of every generated registration number.
pub const REGISTRATION_PREFIX: &str = "LRS";

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::farmers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Farmer {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub phone_number: String,
    pub email: Option<String>,
    pub registration_number: String,
    pub number_of_plots: i32,
    pub amount_per_plot: BigDecimal,
    pub total_amount: BigDecimal,
    pub location_id: i32,
    pub block_id: i32,
    pub section_id: i32,
    pub role: FarmerRole,
    pub next_of_kin: Option<String>,
    pub is_active: bool,
    pub date_registered: Timestamp,
}

impl Farmer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Amount owed for the farmer's plots, derived from the current terms.
    pub fn amount_due(&self) -> BigDecimal {
        compute_total(self.number_of_plots, &self.amount_per_plot)
    }

    /// The writable state of this row, used as the base when merging an update.
    pub fn to_changeset(&self) -> FarmerChangeset {
        FarmerChangeset {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            middle_name: self.middle_name.clone(),
            gender: self.gender,
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            number_of_plots: self.number_of_plots,
            amount_per_plot: self.amount_per_plot.clone(),
            total_amount: self.total_amount.clone(),
            location_id: self.location_id,
            block_id: self.block_id,
            section_id: self.section_id,
            role: self.role,
            next_of_kin: self.next_of_kin.clone(),
        }
    }
}

/// Every column an update may write. `registration_number` is deliberately absent.
#[derive(Debug, AsChangeset, Clone, PartialEq)]
#[diesel(table_name = crate::schema::farmers)]
#[diesel(treat_none_as_null = true)]
pub struct FarmerChangeset {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub phone_number: String,
    pub email: Option<String>,
    pub number_of_plots: i32,
    pub amount_per_plot: BigDecimal,
    pub total_amount: BigDecimal,
    pub location_id: i32,
    pub block_id: i32,
    pub section_id: i32,
    pub role: FarmerRole,
    pub next_of_kin: Option<String>,
}

impl FarmerChangeset {
    /// Overwrites `total_amount` with plots × rate.
    pub fn recompute_total(mut self) -> Self {
        self.total_amount = compute_total(self.number_of_plots, &self.amount_per_plot);
        self
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::farmers)]
pub struct NewFarmer {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub phone_number: String,
    pub email: Option<String>,
    pub registration_number: String,
    pub number_of_plots: i32,
    pub amount_per_plot: BigDecimal,
    pub total_amount: BigDecimal,
    pub location_id: i32,
    pub block_id: i32,
    pub section_id: i32,
    pub role: FarmerRole,
    pub next_of_kin: Option<String>,
}

impl NewFarmer {
    pub fn from_changeset(changes: FarmerChangeset, registration_number: String) -> Self {
        let changes = changes.recompute_total();
        Self {
            first_name: changes.first_name,
            last_name: changes.last_name,
            middle_name: changes.middle_name,
            gender: changes.gender,
            phone_number: changes.phone_number,
            email: changes.email,
            registration_number,
            number_of_plots: changes.number_of_plots,
            amount_per_plot: changes.amount_per_plot,
            total_amount: changes.total_amount,
            location_id: changes.location_id,
            block_id: changes.block_id,
            section_id: changes.section_id,
            role: changes.role,
            next_of_kin: changes.next_of_kin,
        }
    }
}

pub fn compute_total(number_of_plots: i32, amount_per_plot: &BigDecimal) -> BigDecimal {
    amount_per_plot * BigDecimal::from(number_of_plots)
}

/// `LRS` followed by the sequence zero-padded to five digits.
pub fn format_registration_number(sequence: i64) -> String {
    format!("{}{:05}", REGISTRATION_PREFIX, sequence)
}

/// Next sequence value from the highest existing farmer id.
pub fn next_registration_sequence(max_id: Option<i32>) -> i64 {
    i64::from(max_id.unwrap_or(0)) + 1
}
