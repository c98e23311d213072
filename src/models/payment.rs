use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::{Date, Timestamp};

use crate::models::{PaymentMethod, PaymentType};

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: i32,
    pub farmer_id: i32,
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    pub description: String,
    pub date_paid: Date,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub recorded_by: Option<i32>,
    pub timestamp: Timestamp,
    pub is_verified: bool,
    pub verified_by: Option<i32>,
    pub verification_date: Option<Timestamp>,
    pub notes: Option<String>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub farmer_id: i32,
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    pub description: String,
    pub date_paid: Date,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub recorded_by: Option<i32>,
    pub notes: Option<String>,
}

/// Ledger columns editable after recording. Verification state is not among them.
#[derive(Debug, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(treat_none_as_null = true)]
pub struct PaymentChangeset {
    pub farmer_id: i32,
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    pub description: String,
    pub date_paid: Date,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub notes: Option<String>,
}
