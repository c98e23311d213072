//! Discipline case DTOs.

use jiff::civil;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{CaseStatus, DisciplineCase, OffenceType, Severity};
use crate::repositories::{CaseFilter, CaseSortKey, Sort};
use crate::services::{CaseInput, CasePatch, CaseStats, DEFAULT_CASE_SORT};

/// Opens a case. Block and section are taken from the farmer.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCaseRequest {
    #[schema(example = 12)]
    pub farmer_id: i32,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_incident: Option<civil::Date>,
    pub offence_type: OffenceType,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub offence_description: String,
    #[serde(default)]
    pub action_taken: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub penalty_points: i32,
    #[serde(default)]
    pub comment: String,
    /// A JSON list of evidence items
    #[serde(default = "empty_evidence")]
    #[schema(value_type = Vec<Object>)]
    pub evidence: JsonValue,
}

fn empty_evidence() -> JsonValue {
    JsonValue::Array(Vec::new())
}

impl From<CreateCaseRequest> for CaseInput {
    fn from(request: CreateCaseRequest) -> Self {
        CaseInput {
            farmer_id: request.farmer_id,
            date_incident: request.date_incident,
            offence_type: request.offence_type,
            offence_description: request.offence_description,
            action_taken: request.action_taken,
            status: request.status,
            severity: request.severity,
            penalty_points: request.penalty_points,
            comment: request.comment,
            evidence: request.evidence,
        }
    }
}

/// Partial update. Farmer, block and section cannot change.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCaseRequest {
    #[schema(value_type = Option<String>, format = Date)]
    pub date_incident: Option<civil::Date>,
    pub offence_type: Option<OffenceType>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub offence_description: Option<String>,
    pub action_taken: Option<String>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub penalty_points: Option<i32>,
    pub comment: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub evidence: Option<JsonValue>,
}

impl From<UpdateCaseRequest> for CasePatch {
    fn from(request: UpdateCaseRequest) -> Self {
        CasePatch {
            date_incident: request.date_incident,
            offence_type: request.offence_type,
            offence_description: request.offence_description,
            action_taken: request.action_taken,
            status: request.status,
            severity: request.severity,
            penalty_points: request.penalty_points,
            comment: request.comment,
            evidence: request.evidence,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct ResolveCaseRequest {
    #[schema(example = "Fined and warned")]
    pub action_taken: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CaseResponse {
    pub id: i32,
    pub farmer: i32,
    pub block: Option<i32>,
    pub section: Option<i32>,
    #[schema(value_type = String, format = DateTime)]
    pub date_reported: jiff::Timestamp,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_incident: Option<civil::Date>,
    pub offence_type: OffenceType,
    pub offence_description: String,
    pub action_taken: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub penalty_points: i32,
    pub comment: String,
    pub reported_by: Option<i32>,
    pub resolved_by: Option<i32>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub resolution_date: Option<jiff::Timestamp>,
    #[schema(value_type = Vec<Object>)]
    pub evidence: JsonValue,
}

impl From<DisciplineCase> for CaseResponse {
    fn from(case: DisciplineCase) -> Self {
        Self {
            id: case.id,
            farmer: case.farmer_id,
            block: case.block_id,
            section: case.section_id,
            date_reported: case.date_reported.to_jiff(),
            date_incident: case.date_incident.map(|d| d.to_jiff()),
            offence_type: case.offence_type,
            offence_description: case.offence_description,
            action_taken: case.action_taken,
            status: case.status,
            severity: case.severity,
            penalty_points: case.penalty_points,
            comment: case.comment,
            reported_by: case.reported_by,
            resolved_by: case.resolved_by,
            resolution_date: case.resolution_date.map(|ts| ts.to_jiff()),
            evidence: case.evidence,
        }
    }
}

/// Case listing filters. Date ranges are inclusive calendar days (UTC).
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CaseListQuery {
    pub block: Option<i32>,
    pub section: Option<i32>,
    pub offence_type: Option<OffenceType>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub reported_by: Option<i32>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_reported_after: Option<civil::Date>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_reported_before: Option<civil::Date>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_incident_after: Option<civil::Date>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_incident_before: Option<civil::Date>,
    pub penalty_points_min: Option<i32>,
    pub penalty_points_max: Option<i32>,
    /// Matches farmer names or offence type
    pub search: Option<String>,
    /// `date_reported`, `severity` or `penalty_points`; prefix `-` to descend
    #[param(example = "-date_reported")]
    pub ordering: Option<String>,
}

impl CaseListQuery {
    pub fn sort(&self) -> Sort<CaseSortKey> {
        Sort::parse_or(self.ordering.as_deref(), DEFAULT_CASE_SORT)
    }
}

impl From<CaseListQuery> for CaseFilter {
    fn from(query: CaseListQuery) -> Self {
        CaseFilter {
            block_id: query.block,
            section_id: query.section,
            offence_type: query.offence_type,
            status: query.status,
            severity: query.severity,
            reported_by: query.reported_by,
            reported_after: query.date_reported_after.and_then(start_of_day),
            reported_before: query
                .date_reported_before
                .and_then(|d| d.tomorrow().ok())
                .and_then(start_of_day),
            incident_after: query.date_incident_after.map(Into::into),
            incident_before: query.date_incident_before.map(Into::into),
            min_penalty_points: query.penalty_points_min,
            max_penalty_points: query.penalty_points_max,
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

fn start_of_day(date: civil::Date) -> Option<jiff_diesel::Timestamp> {
    date.to_zoned(TimeZone::UTC)
        .ok()
        .map(|zoned| zoned.timestamp().into())
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct CaseStatsResponse {
    pub total_cases: i64,
    pub open_cases: i64,
    pub resolved_cases: i64,
    /// Cases of severity `serious`
    pub serious_cases: i64,
}

impl From<CaseStats> for CaseStatsResponse {
    fn from(stats: CaseStats) -> Self {
        Self {
            total_cases: stats.total_cases,
            open_cases: stats.open_cases,
            resolved_cases: stats.resolved_cases,
            serious_cases: stats.serious_cases,
        }
    }
}
