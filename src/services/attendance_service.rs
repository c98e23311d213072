//! Attendance ledger: recording, scoped listing, statistics and penalty reset.

use jiff_diesel::{Date, Time};

use crate::access::{Caller, Capability, RecordScope};
use crate::error::{AppError, AppResult};
use crate::models::{Attendance, AttendanceStatus, AttendanceType, NewAttendance, Role};
use crate::repositories::{AttendanceFilter, AttendanceRepository, FarmerRepository};
use crate::utils::Clock;

pub const CANAL_CLEANING_NEEDS_PLACEMENT: &str =
    "Block and section are required for block canal cleaning.";

#[derive(Debug, Clone)]
pub struct AttendanceInput {
    pub farmer_id: i32,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub date: jiff::civil::Date,
    pub time: Option<jiff::civil::Time>,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    pub comment: Option<String>,
    pub penalty_points: i32,
    pub duration_minutes: i32,
}

/// Counts per status over one block or the whole scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceStats {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

impl AttendanceStats {
    pub fn tally(rows: &[(AttendanceStatus, i64)]) -> Self {
        rows.iter()
            .fold(Self::default(), |mut stats, (status, count)| {
                match status {
                    AttendanceStatus::Present => stats.present += count,
                    AttendanceStatus::Absent => stats.absent += count,
                    AttendanceStatus::Late => stats.late += count,
                    AttendanceStatus::Excused => stats.excused += count,
                }
                stats.total += count;
                stats
            })
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    attendance: AttendanceRepository,
    farmers: FarmerRepository,
    clock: Clock,
}

impl AttendanceService {
    pub fn new(attendance: AttendanceRepository, farmers: FarmerRepository, clock: Clock) -> Self {
        Self {
            attendance,
            farmers,
            clock,
        }
    }

    /// Records one attendance entry. A second entry for the same farmer, date
    /// and type is rejected by the unique constraint.
    pub async fn record(&self, caller: &Caller, input: AttendanceInput) -> AppResult<Attendance> {
        caller.require(Capability::RecordAttendance)?;
        caller.check_attendance_placement(input.block_id, input.section_id)?;
        check_payload(&input)?;

        if self.farmers.find_by_id(input.farmer_id).await?.is_none() {
            return Err(AppError::validation("farmer", "Invalid farmer ID."));
        }

        let record = NewAttendance {
            farmer_id: input.farmer_id,
            block_id: input.block_id,
            section_id: input.section_id,
            date: Date::from(input.date),
            time: input.time.map(Time::from),
            attendance_type: input.attendance_type,
            status: input.status,
            recorded_by: Some(caller.user_id),
            comment: input.comment.filter(|c| !c.trim().is_empty()),
            penalty_points: input.penalty_points,
            duration_minutes: input.duration_minutes,
        };

        let created = self.attendance.create(record).await?;
        tracing::info!(
            attendance_id = created.id,
            farmer_id = created.farmer_id,
            status = %created.status,
            recorded_by = caller.user_id,
            "Attendance recorded"
        );
        Ok(created)
    }

    /// Admins see everything; block chairs see their own block and section.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: &AttendanceFilter,
    ) -> AppResult<Vec<Attendance>> {
        if !caller.can(Capability::ListAttendance) {
            return Err(AppError::forbidden(
                "You don't have permission to view attendance records.",
            ));
        }
        let scope = caller.placement_scope()?;
        self.attendance.list(filter, scope).await
    }

    /// A block chair's view of their own block, optionally only today.
    pub async fn list_for_block(
        &self,
        caller: &Caller,
        block_id: i32,
        today_only: bool,
    ) -> AppResult<Vec<Attendance>> {
        if caller.role != Role::BlockChair {
            return Err(AppError::forbidden(
                "Only block chairs can access this endpoint.",
            ));
        }
        if caller.block_id != Some(block_id) {
            tracing::warn!(user_id = caller.user_id, block_id, "Block view outside assignment");
            return Err(AppError::forbidden(
                "You can only access attendance from your assigned block.",
            ));
        }

        let filter = AttendanceFilter {
            block_id: Some(block_id),
            date: today_only.then(|| Date::from(self.clock.today())),
            ..Default::default()
        };
        self.attendance.list(&filter, RecordScope::All).await
    }

    /// Block chairs always get their own block; other roles may pick one.
    pub async fn stats(
        &self,
        caller: &Caller,
        block_id: Option<i32>,
    ) -> AppResult<AttendanceStats> {
        caller.require(Capability::AdministrativeAccess)?;
        let block_id = stats_block(caller, block_id)?;
        let rows = self.attendance.count_by_status(block_id).await?;
        Ok(AttendanceStats::tally(&rows))
    }

    /// Zeroes every penalty point recorded against the farmer.
    pub async fn reset_penalties(&self, caller: &Caller, farmer_id: i32) -> AppResult<usize> {
        caller.require(Capability::ResetPenalties)?;
        if self.farmers.find_by_id(farmer_id).await?.is_none() {
            return Err(AppError::not_found("farmer", farmer_id));
        }

        let reset = self.attendance.reset_penalties(farmer_id).await?;
        tracing::info!(farmer_id, records = reset, actor = caller.user_id, "Penalties reset");
        Ok(reset)
    }
}

/// Block canal cleaning happens inside a block, so it must name one.
pub fn check_payload(input: &AttendanceInput) -> AppResult<()> {
    if input.attendance_type == AttendanceType::BlockCanalCleaning
        && (input.block_id.is_none() || input.section_id.is_none())
    {
        return Err(AppError::validation("block", CANAL_CLEANING_NEEDS_PLACEMENT));
    }
    if input.penalty_points < 0 {
        return Err(AppError::validation(
            "penalty_points",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if input.duration_minutes < 0 {
        return Err(AppError::validation(
            "duration_minutes",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}

fn stats_block(caller: &Caller, requested: Option<i32>) -> AppResult<Option<i32>> {
    if caller.role.is_scoped() {
        return caller
            .block_id
            .map(Some)
            .ok_or_else(|| AppError::bad_request("No block assigned to this chair."));
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn input(attendance_type: AttendanceType, block: Option<i32>, section: Option<i32>) -> AttendanceInput {
        AttendanceInput {
            farmer_id: 1,
            block_id: block,
            section_id: section,
            date: date(2025, 6, 14),
            time: None,
            attendance_type,
            status: AttendanceStatus::Present,
            comment: None,
            penalty_points: 0,
            duration_minutes: 120,
        }
    }

    fn caller(role: Role, block_id: Option<i32>) -> Caller {
        Caller {
            user_id: 7,
            username: "u".to_string(),
            role,
            block_id,
            section_id: block_id,
        }
    }

    #[test]
    fn test_block_canal_cleaning_needs_block_and_section() {
        assert!(check_payload(&input(AttendanceType::BlockCanalCleaning, Some(1), Some(2))).is_ok());
        for (block, section) in [(None, Some(2)), (Some(1), None), (None, None)] {
            match check_payload(&input(AttendanceType::BlockCanalCleaning, block, section)) {
                Err(AppError::Validation { reason, .. }) => {
                    assert_eq!(reason, CANAL_CLEANING_NEEDS_PLACEMENT)
                }
                other => panic!("Expected Validation, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_other_types_may_omit_placement() {
        for kind in [
            AttendanceType::GeneralAssembly,
            AttendanceType::MainCanalCleaning,
            AttendanceType::Training,
            AttendanceType::FieldInspection,
        ] {
            assert!(check_payload(&input(kind, None, None)).is_ok(), "{:?}", kind);
        }
    }

    #[test]
    fn test_negative_counters_rejected() {
        let mut payload = input(AttendanceType::Training, None, None);
        payload.duration_minutes = -5;
        assert!(matches!(
            check_payload(&payload),
            Err(AppError::Validation { field, .. }) if field == "duration_minutes"
        ));
    }

    #[test]
    fn test_tally() {
        let stats = AttendanceStats::tally(&[
            (AttendanceStatus::Present, 12),
            (AttendanceStatus::Late, 3),
            (AttendanceStatus::Excused, 1),
        ]);
        assert_eq!(
            stats,
            AttendanceStats {
                total: 16,
                present: 12,
                absent: 0,
                late: 3,
                excused: 1
            }
        );
        assert_eq!(AttendanceStats::tally(&[]), AttendanceStats::default());
    }

    #[test]
    fn test_chair_stats_forced_to_own_block() {
        assert_eq!(stats_block(&caller(Role::BlockChair, Some(4)), Some(9)).unwrap(), Some(4));
        assert!(matches!(
            stats_block(&caller(Role::BlockChair, None), Some(9)),
            Err(AppError::BadRequest { .. })
        ));
        assert_eq!(stats_block(&caller(Role::Admin, None), Some(9)).unwrap(), Some(9));
        assert_eq!(stats_block(&caller(Role::President, None), None).unwrap(), None);
    }
}
