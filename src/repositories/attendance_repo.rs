//! Attendance ledger repository.

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::Date;

use crate::access::RecordScope;
use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Attendance, AttendanceStatus, NewAttendance};
use crate::schema::{attendance, blocks};

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub status: Option<AttendanceStatus>,
    pub date: Option<Date>,
}

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: AsyncDbPool,
}

impl AttendanceRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Inserts a record; a second record for the same farmer, date and type
    /// violates `attendance_farmer_date_type_key`.
    pub async fn create(&self, record: NewAttendance) -> Result<Attendance, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(attendance::table)
            .values(&record)
            .returning(Attendance::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn list(
        &self,
        filter: &AttendanceFilter,
        scope: RecordScope,
    ) -> Result<Vec<Attendance>, AppError> {
        let mut conn = self.pool.get().await?;

        let mut query = attendance::table.into_boxed();
        match scope {
            RecordScope::All => {}
            RecordScope::BlockSection {
                block_id,
                section_id,
            } => {
                query = query
                    .filter(attendance::block_id.eq(block_id))
                    .filter(attendance::section_id.eq(section_id));
            }
            RecordScope::ChairedBy(user_id) => {
                query = query.filter(
                    attendance::block_id.eq_any(
                        blocks::table
                            .filter(blocks::chair_id.eq(user_id))
                            .select(blocks::id.nullable()),
                    ),
                );
            }
        }
        if let Some(block_id) = filter.block_id {
            query = query.filter(attendance::block_id.eq(block_id));
        }
        if let Some(section_id) = filter.section_id {
            query = query.filter(attendance::section_id.eq(section_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(attendance::status.eq(status));
        }
        if let Some(date) = filter.date {
            query = query.filter(attendance::date.eq(date));
        }

        query
            .order((attendance::date.desc(), attendance::id.desc()))
            .select(Attendance::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Record counts per status, optionally for one block.
    pub async fn count_by_status(
        &self,
        block_id: Option<i32>,
    ) -> Result<Vec<(AttendanceStatus, i64)>, AppError> {
        let mut conn = self.pool.get().await?;

        let rows = match block_id {
            Some(block_id) => {
                attendance::table
                    .filter(attendance::block_id.eq(block_id))
                    .group_by(attendance::status)
                    .select((attendance::status, count_star()))
                    .load(&mut conn)
                    .await?
            }
            None => {
                attendance::table
                    .group_by(attendance::status)
                    .select((attendance::status, count_star()))
                    .load(&mut conn)
                    .await?
            }
        };
        Ok(rows)
    }

    pub async fn count_with_status(&self, status: AttendanceStatus) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        attendance::table
            .filter(attendance::status.eq(status))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Sets penalty points of every record of the farmer to zero.
    pub async fn reset_penalties(&self, farmer_id: i32) -> Result<usize, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(attendance::table.filter(attendance::farmer_id.eq(farmer_id)))
            .set(attendance::penalty_points.eq(0))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
