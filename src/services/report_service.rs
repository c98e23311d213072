//! Read-only rollups across the ledgers for the dashboard.

use bigdecimal::{BigDecimal, Zero};

use crate::access::{Caller, Capability};
use crate::error::AppResult;
use crate::models::{AttendanceStatus, Farmer};
use crate::repositories::{AttendanceRepository, FarmerRepository, PaymentRepository, PlotsRow};

/// Meetings per farmer the attendance rate is measured against.
const EXPECTED_SESSIONS_PER_FARMER: i64 = 4;
const TOP_UNPAID_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct UnpaidFarmer {
    pub id: i32,
    pub name: String,
    pub block: String,
    pub section: String,
    pub outstanding: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_farmers: i64,
    pub attendance_rate: f64,
    pub fines_collected: BigDecimal,
    pub plots_summary: Vec<PlotsRow>,
    pub top_unpaid: Vec<UnpaidFarmer>,
}

/// Present records as a percentage of four sessions per active farmer, to one
/// decimal place. Zero when there are no active farmers.
pub fn attendance_rate(present: i64, active_farmers: i64) -> f64 {
    let expected = active_farmers * EXPECTED_SESSIONS_PER_FARMER;
    if expected <= 0 {
        return 0.0;
    }
    let rate = present as f64 / expected as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// The farmers owing the most, largest balance first. Farmers with nothing
/// paid owe their whole total; balances of zero or less are left out.
pub fn rank_top_unpaid(
    rows: Vec<(Farmer, String, String, Option<BigDecimal>)>,
    limit: usize,
) -> Vec<UnpaidFarmer> {
    let mut unpaid: Vec<UnpaidFarmer> = rows
        .into_iter()
        .filter_map(|(farmer, block, section, paid)| {
            let outstanding = &farmer.total_amount - paid.unwrap_or_default();
            (outstanding > BigDecimal::zero()).then(|| UnpaidFarmer {
                id: farmer.id,
                name: farmer.full_name(),
                block,
                section,
                outstanding,
            })
        })
        .collect();

    unpaid.sort_by(|a, b| b.outstanding.cmp(&a.outstanding).then(a.id.cmp(&b.id)));
    unpaid.truncate(limit);
    unpaid
}

#[derive(Clone)]
pub struct ReportService {
    farmers: FarmerRepository,
    attendance: AttendanceRepository,
    payments: PaymentRepository,
}

impl ReportService {
    pub fn new(
        farmers: FarmerRepository,
        attendance: AttendanceRepository,
        payments: PaymentRepository,
    ) -> Self {
        Self {
            farmers,
            attendance,
            payments,
        }
    }

    pub async fn dashboard(&self, caller: &Caller) -> AppResult<DashboardStats> {
        caller.require(Capability::AdministrativeAccess)?;

        let total_farmers = self.farmers.count_active().await?;
        let present = self
            .attendance
            .count_with_status(AttendanceStatus::Present)
            .await?;
        let fines_collected = self.payments.sum_fines().await?;
        let plots_summary = self.farmers.plots_summary().await?;
        let balances = self.farmers.active_with_paid_totals().await?;

        Ok(DashboardStats {
            total_farmers,
            attendance_rate: attendance_rate(present, total_farmers),
            fines_collected,
            plots_summary,
            top_unpaid: rank_top_unpaid(balances, TOP_UNPAID_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FarmerRole, Gender};
    use jiff::Timestamp;
    use proptest::prelude::*;

    fn farmer(id: i32, total: i64) -> Farmer {
        Farmer {
            id,
            first_name: format!("F{}", id),
            last_name: "Banda".to_string(),
            middle_name: None,
            gender: Gender::Female,
            phone_number: format!("+26599900{:04}", id),
            email: None,
            registration_number: format!("LRS{:05}", id),
            number_of_plots: 1,
            amount_per_plot: BigDecimal::from(total),
            total_amount: BigDecimal::from(total),
            location_id: 1,
            block_id: 1,
            section_id: 1,
            role: FarmerRole::Farmer,
            next_of_kin: None,
            is_active: true,
            date_registered: Timestamp::UNIX_EPOCH.into(),
        }
    }

    fn row(id: i32, total: i64, paid: Option<i64>) -> (Farmer, String, String, Option<BigDecimal>) {
        (
            farmer(id, total),
            "Block A".to_string(),
            "S1".to_string(),
            paid.map(BigDecimal::from),
        )
    }

    #[test]
    fn test_attendance_rate_example() {
        assert_eq!(attendance_rate(20, 10), 50.0);
    }

    #[test]
    fn test_attendance_rate_rounds_to_one_decimal() {
        assert_eq!(attendance_rate(1, 3), 8.3);
        assert_eq!(attendance_rate(2, 3), 16.7);
    }

    #[test]
    fn test_attendance_rate_without_farmers_is_zero() {
        assert_eq!(attendance_rate(15, 0), 0.0);
        assert_eq!(attendance_rate(0, 0), 0.0);
    }

    #[test]
    fn test_outstanding_balance() {
        let ranked = rank_top_unpaid(vec![row(1, 1000, Some(300))], 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].outstanding, BigDecimal::from(700));
        assert_eq!(ranked[0].name, "F1 Banda");
    }

    #[test]
    fn test_ranking_keeps_five_largest_positive_balances() {
        let rows = vec![
            row(1, 1000, Some(300)),
            row(2, 500, Some(500)),
            row(3, 400, Some(600)),
            row(4, 900, None),
            row(5, 100, Some(50)),
            row(6, 2000, Some(100)),
            row(7, 300, Some(100)),
            row(8, 250, None),
        ];

        let ids: Vec<i32> = rank_top_unpaid(rows, 5).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![6, 4, 1, 8, 7]);
    }

    proptest! {
        #[test]
        fn prop_ranking_is_sorted_positive_and_bounded(
            balances in proptest::collection::vec((0i64..10_000, proptest::option::of(0i64..10_000)), 0..30)
        ) {
            let rows = balances
                .iter()
                .enumerate()
                .map(|(i, (total, paid))| row(i as i32, *total, *paid))
                .collect();
            let ranked = rank_top_unpaid(rows, 5);

            prop_assert!(ranked.len() <= 5);
            prop_assert!(ranked.iter().all(|u| u.outstanding > BigDecimal::zero()));
            prop_assert!(ranked.windows(2).all(|w| w[0].outstanding >= w[1].outstanding));
        }

        #[test]
        fn prop_rate_is_bounded_when_present_fits(active in 1i64..1000, ratio in 0.0f64..=1.0) {
            let present = ((active * 4) as f64 * ratio).floor() as i64;
            let rate = attendance_rate(present, active);
            prop_assert!((0.0..=100.0).contains(&rate));
        }
    }
}
