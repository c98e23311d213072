use diesel::prelude::*;
use jiff_diesel::{Date, Time};

use crate::models::{AttendanceStatus, AttendanceType};

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::attendance)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Attendance {
    pub id: i32,
    pub farmer_id: i32,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub date: Date,
    pub time: Option<Time>,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    pub recorded_by: Option<i32>,
    pub comment: Option<String>,
    pub penalty_points: i32,
    pub duration_minutes: i32,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::attendance)]
pub struct NewAttendance {
    pub farmer_id: i32,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub date: Date,
    pub time: Option<Time>,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    pub recorded_by: Option<i32>,
    pub comment: Option<String>,
    pub penalty_points: i32,
    pub duration_minutes: i32,
}
