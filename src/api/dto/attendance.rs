//! Attendance ledger DTOs.

use jiff::civil;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Attendance, AttendanceStatus, AttendanceType};
use crate::repositories::AttendanceFilter;
use crate::services::{AttendanceInput, AttendanceStats};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAttendanceRequest {
    #[schema(example = 12)]
    pub farmer: i32,
    /// Required for block canal cleaning
    pub block: Option<i32>,
    /// Required for block canal cleaning
    pub section: Option<i32>,
    #[schema(value_type = String, format = Date, example = "2025-06-14")]
    pub date: civil::Date,
    #[schema(value_type = Option<String>, example = "07:30:00")]
    pub time: Option<civil::Time>,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub penalty_points: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub duration_minutes: i32,
}

impl From<CreateAttendanceRequest> for AttendanceInput {
    fn from(request: CreateAttendanceRequest) -> Self {
        AttendanceInput {
            farmer_id: request.farmer,
            block_id: request.block,
            section_id: request.section,
            date: request.date,
            time: request.time,
            attendance_type: request.attendance_type,
            status: request.status,
            comment: request.comment,
            penalty_points: request.penalty_points,
            duration_minutes: request.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: i32,
    pub farmer: i32,
    pub block: Option<i32>,
    pub section: Option<i32>,
    #[schema(value_type = String, format = Date)]
    pub date: civil::Date,
    #[schema(value_type = Option<String>)]
    pub time: Option<civil::Time>,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    pub recorded_by: Option<i32>,
    pub comment: Option<String>,
    pub penalty_points: i32,
    pub duration_minutes: i32,
}

impl From<Attendance> for AttendanceResponse {
    fn from(record: Attendance) -> Self {
        Self {
            id: record.id,
            farmer: record.farmer_id,
            block: record.block_id,
            section: record.section_id,
            date: record.date.to_jiff(),
            time: record.time.map(|t| t.to_jiff()),
            attendance_type: record.attendance_type,
            status: record.status,
            recorded_by: record.recorded_by,
            comment: record.comment,
            penalty_points: record.penalty_points,
            duration_minutes: record.duration_minutes,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AttendanceListQuery {
    pub block: Option<i32>,
    pub section: Option<i32>,
    pub status: Option<AttendanceStatus>,
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<civil::Date>,
}

impl From<AttendanceListQuery> for AttendanceFilter {
    fn from(query: AttendanceListQuery) -> Self {
        AttendanceFilter {
            block_id: query.block,
            section_id: query.section,
            status: query.status,
            date: query.date.map(Into::into),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct BlockAttendanceQuery {
    /// Restrict to records dated today
    pub today: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AttendanceStatsQuery {
    /// Ignored for block chairs, who always get their own block
    pub block_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct AttendanceStatsResponse {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

impl From<AttendanceStats> for AttendanceStatsResponse {
    fn from(stats: AttendanceStats) -> Self {
        Self {
            total: stats.total,
            present: stats.present,
            absent: stats.absent,
            late: stats.late,
            excused: stats.excused,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PenaltyResetResponse {
    #[schema(example = "Penalties reset for farmer 12.")]
    pub status: String,
}

impl PenaltyResetResponse {
    pub fn for_farmer(farmer_id: i32) -> Self {
        Self {
            status: format!("Penalties reset for farmer {farmer_id}."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::{date, time};

    #[test]
    fn test_create_request_defaults_counters() {
        let request: CreateAttendanceRequest = serde_json::from_str(
            r#"{"farmer":3,"date":"2025-06-14","time":"07:30:00",
                "attendance_type":"training","status":"late"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let input = AttendanceInput::from(request);
        assert_eq!(input.farmer_id, 3);
        assert_eq!(input.date, date(2025, 6, 14));
        assert_eq!(input.time, Some(time(7, 30, 0, 0)));
        assert_eq!(input.penalty_points, 0);
        assert_eq!(input.duration_minutes, 0);
        assert!(input.block_id.is_none());
    }

    #[test]
    fn test_negative_penalty_fails_validation() {
        let request: CreateAttendanceRequest = serde_json::from_str(
            r#"{"farmer":3,"date":"2025-06-14","attendance_type":"training",
                "status":"absent","penalty_points":-1}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("penalty_points"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed = serde_json::from_str::<CreateAttendanceRequest>(
            r#"{"farmer":3,"date":"2025-06-14","attendance_type":"training","status":"asleep"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_list_query_maps_to_filter() {
        let filter = AttendanceFilter::from(AttendanceListQuery {
            block: Some(2),
            status: Some(AttendanceStatus::Absent),
            date: Some(date(2025, 1, 31)),
            ..Default::default()
        });
        assert_eq!(filter.block_id, Some(2));
        assert_eq!(filter.status, Some(AttendanceStatus::Absent));
        assert_eq!(filter.date.map(|d| d.to_jiff()), Some(date(2025, 1, 31)));
    }

    #[test]
    fn test_penalty_reset_message() {
        let body = serde_json::to_value(PenaltyResetResponse::for_farmer(12)).unwrap();
        assert_eq!(body["status"], "Penalties reset for farmer 12.");
    }
}
