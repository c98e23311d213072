use diesel::prelude::*;
use jiff_diesel::{Date, Timestamp};
use serde_json::Value as JsonValue;

use crate::models::{CaseStatus, OffenceType, Severity};

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::discipline_cases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DisciplineCase {
    pub id: i32,
    pub farmer_id: i32,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub date_reported: Timestamp,
    pub date_incident: Option<Date>,
    pub offence_type: OffenceType,
    pub offence_description: String,
    pub action_taken: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub penalty_points: i32,
    pub comment: String,
    pub reported_by: Option<i32>,
    pub resolved_by: Option<i32>,
    pub resolution_date: Option<Timestamp>,
    pub evidence: JsonValue,
}

/// Insert row. `block_id`/`section_id` are the snapshot taken at creation.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::discipline_cases)]
pub struct NewDisciplineCase {
    pub farmer_id: i32,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub date_incident: Option<Date>,
    pub offence_type: OffenceType,
    pub offence_description: String,
    pub action_taken: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub penalty_points: i32,
    pub comment: String,
    pub reported_by: Option<i32>,
    pub resolved_by: Option<i32>,
    pub resolution_date: Option<Timestamp>,
    pub evidence: JsonValue,
}

/// Columns an update may touch; farmer, block and section are frozen.
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::discipline_cases)]
pub struct DisciplineCaseChangeset {
    pub date_incident: Option<Option<Date>>,
    pub offence_type: Option<OffenceType>,
    pub offence_description: Option<String>,
    pub action_taken: Option<String>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub penalty_points: Option<i32>,
    pub comment: Option<String>,
    pub resolved_by: Option<Option<i32>>,
    pub resolution_date: Option<Option<Timestamp>>,
    pub evidence: Option<JsonValue>,
}
