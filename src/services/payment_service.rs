//! Payment ledger with the one-way verification step and rolling statistics.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use jiff::civil::Date;
use jiff::{Timestamp, ToSpan};

use crate::access::{Caller, Capability};
use crate::error::{AppError, AppResult};
use crate::models::{Farmer, NewPayment, Payment, PaymentChangeset, PaymentMethod, PaymentType};
use crate::repositories::{
    FarmerRepository, LedgerTally, PaidWindow, PaymentFilter, PaymentRepository, PaymentSortKey,
    Sort, VerifyOutcome,
};
use crate::utils::Clock;

pub const OTHER_BLOCK_PAYMENT: &str = "Cannot access payments from other blocks";
pub const ALREADY_VERIFIED: &str = "Already verified";
pub const FINE_NEEDS_DESCRIPTION: &str = "Description is required for fines";
const DESCRIPTION_MAX_CHARS: usize = 120;

pub const DEFAULT_PAYMENT_SORT: Sort<PaymentSortKey> = Sort {
    key: PaymentSortKey::DatePaid,
    descending: true,
};

#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub farmer_id: i32,
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    pub description: String,
    pub date_paid: Date,
    pub method: PaymentMethod,
    pub reference_code: Option<String>,
    pub notes: Option<String>,
}

/// A partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PaymentPatch {
    pub farmer_id: Option<i32>,
    pub amount: Option<BigDecimal>,
    pub payment_type: Option<PaymentType>,
    pub description: Option<String>,
    pub date_paid: Option<Date>,
    pub method: Option<PaymentMethod>,
    pub reference_code: Option<String>,
    pub notes: Option<String>,
}

impl PaymentPatch {
    fn apply(self, current: &Payment) -> PaymentChangeset {
        PaymentChangeset {
            farmer_id: self.farmer_id.unwrap_or(current.farmer_id),
            amount: self.amount.unwrap_or_else(|| current.amount.clone()),
            payment_type: self.payment_type.unwrap_or(current.payment_type),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            date_paid: self.date_paid.map(Into::into).unwrap_or(current.date_paid),
            method: self.method.unwrap_or(current.method),
            reference_code: self.reference_code.or_else(|| current.reference_code.clone()),
            notes: self.notes.or_else(|| current.notes.clone()),
        }
    }
}

/// A payment with the farmer it was made by.
#[derive(Debug, Clone)]
pub struct PaymentView {
    pub payment: Payment,
    pub farmer: Option<Farmer>,
}

impl PaymentView {
    /// What the farmer owes in total, recomputed from their current terms.
    pub fn total_amount_due(&self) -> Option<BigDecimal> {
        self.farmer.as_ref().map(Farmer::amount_due)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowTotals {
    pub count: i64,
    pub sum: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTotals {
    pub payment_type: PaymentType,
    pub count: i64,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStats {
    pub total_payments: i64,
    pub total_amount: BigDecimal,
    pub today: WindowTotals,
    pub last_week: WindowTotals,
    pub last_month: WindowTotals,
    pub by_type: Vec<TypeTotals>,
    pub verified: i64,
    pub unverified: i64,
}

/// The today, last 7 days and last 30 days windows ending on `today`.
pub fn stats_windows(today: Date) -> [PaidWindow; 3] {
    let since = |days: i64| PaidWindow {
        from: today.checked_sub(days.days()).unwrap_or(today),
        until: None,
    };
    [
        PaidWindow {
            from: today,
            until: Some(today),
        },
        since(7),
        since(30),
    ]
}

/// Folds the per-type, per-verification tallies into the ledger figures.
/// Types are listed in their declared order; types with no payments are left out.
pub fn summarize_payments(
    tallies: &[LedgerTally],
    [today, last_week, last_month]: [WindowTotals; 3],
) -> PaymentStats {
    let mut by_type: HashMap<PaymentType, TypeTotals> = HashMap::new();
    let mut verified = 0;
    let mut unverified = 0;
    for tally in tallies {
        let entry = by_type
            .entry(tally.payment_type)
            .or_insert_with(|| TypeTotals {
                payment_type: tally.payment_type,
                count: 0,
                amount: BigDecimal::zero(),
            });
        entry.count += tally.count;
        entry.amount += &tally.amount;
        if tally.is_verified {
            verified += tally.count;
        } else {
            unverified += tally.count;
        }
    }
    let by_type: Vec<TypeTotals> = PaymentType::ALL
        .iter()
        .filter_map(|kind| by_type.remove(kind))
        .collect();

    PaymentStats {
        total_payments: verified + unverified,
        total_amount: by_type
            .iter()
            .fold(BigDecimal::zero(), |sum, t| sum + &t.amount),
        today,
        last_week,
        last_month,
        by_type,
        verified,
        unverified,
    }
}

/// The payment a verification attempt produced. A payment that was already
/// verified keeps its verifier and date, and the attempt is refused.
pub fn verified_payment(
    outcome: VerifyOutcome,
    payment_id: i32,
    actor: i32,
) -> AppResult<Payment> {
    match outcome {
        VerifyOutcome::Verified(payment) => Ok(payment),
        VerifyOutcome::AlreadyVerified => {
            tracing::warn!(payment_id, actor, "Payment already verified");
            Err(AppError::bad_request(ALREADY_VERIFIED))
        }
        VerifyOutcome::Missing => Err(AppError::not_found("payment", payment_id)),
    }
}

/// Field rules shared by creation and update.
pub fn check_payment(changes: &PaymentChangeset) -> AppResult<()> {
    if changes.amount <= BigDecimal::zero() {
        return Err(AppError::validation(
            "amount",
            "Amount must be greater than zero.",
        ));
    }
    if changes.payment_type == PaymentType::Fine && changes.description.trim().is_empty() {
        return Err(AppError::validation("description", FINE_NEEDS_DESCRIPTION));
    }
    if changes.description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::validation(
            "description",
            format!(
                "Ensure this field has no more than {} characters.",
                DESCRIPTION_MAX_CHARS
            ),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PaymentService {
    payments: PaymentRepository,
    farmers: FarmerRepository,
    clock: Clock,
}

impl PaymentService {
    pub fn new(payments: PaymentRepository, farmers: FarmerRepository, clock: Clock) -> Self {
        Self {
            payments,
            farmers,
            clock,
        }
    }

    pub async fn create(&self, caller: &Caller, input: PaymentInput) -> AppResult<PaymentView> {
        caller.require(Capability::AdministrativeAccess)?;
        let changes = PaymentChangeset {
            farmer_id: input.farmer_id,
            amount: input.amount,
            payment_type: input.payment_type,
            description: input.description,
            date_paid: input.date_paid.into(),
            method: input.method,
            reference_code: input.reference_code,
            notes: input.notes,
        };
        check_payment(&changes)?;
        let farmer = self.payable_farmer(caller, changes.farmer_id).await?;

        let payment = self
            .payments
            .create(NewPayment {
                farmer_id: changes.farmer_id,
                amount: changes.amount,
                payment_type: changes.payment_type,
                description: changes.description,
                date_paid: changes.date_paid,
                method: changes.method,
                reference_code: changes.reference_code,
                recorded_by: Some(caller.user_id),
                notes: changes.notes,
            })
            .await?;
        tracing::info!(
            payment_id = payment.id,
            farmer_id = payment.farmer_id,
            amount = %payment.amount,
            kind = %payment.payment_type,
            recorded_by = caller.user_id,
            "Payment recorded"
        );

        Ok(PaymentView {
            payment,
            farmer: Some(farmer),
        })
    }

    pub async fn get(&self, caller: &Caller, payment_id: i32) -> AppResult<PaymentView> {
        caller.require(Capability::AdministrativeAccess)?;
        let (payment, farmer) = self.reachable(caller, payment_id).await?;
        Ok(PaymentView {
            payment,
            farmer: Some(farmer),
        })
    }

    pub async fn update(
        &self,
        caller: &Caller,
        payment_id: i32,
        patch: PaymentPatch,
    ) -> AppResult<PaymentView> {
        caller.require(Capability::AdministrativeAccess)?;
        let (current, farmer) = self.reachable(caller, payment_id).await?;

        let changes = patch.apply(&current);
        check_payment(&changes)?;
        let farmer = if changes.farmer_id == farmer.id {
            farmer
        } else {
            self.payable_farmer(caller, changes.farmer_id).await?
        };

        let payment = self.payments.update(payment_id, changes).await?;
        tracing::info!(payment_id, actor = caller.user_id, "Payment updated");
        Ok(PaymentView {
            payment,
            farmer: Some(farmer),
        })
    }

    pub async fn delete(&self, caller: &Caller, payment_id: i32) -> AppResult<()> {
        caller.require(Capability::AdministrativeAccess)?;
        self.reachable(caller, payment_id).await?;

        self.payments.delete(payment_id).await?;
        tracing::info!(payment_id, actor = caller.user_id, "Payment deleted");
        Ok(())
    }

    /// Marks an unverified payment as verified. Verifying twice is an error and
    /// leaves the first verifier and date in place.
    pub async fn verify(&self, caller: &Caller, payment_id: i32) -> AppResult<PaymentView> {
        caller.require(Capability::VerifyPayments)?;
        self.reachable(caller, payment_id).await?;

        let outcome = self
            .payments
            .verify(payment_id, caller.user_id, Timestamp::now().into())
            .await?;
        let payment = verified_payment(outcome, payment_id, caller.user_id)?;

        tracing::info!(payment_id, verified_by = caller.user_id, "Payment verified");
        let farmer = self.farmers.find_by_id(payment.farmer_id).await?;
        Ok(PaymentView { payment, farmer })
    }

    pub async fn list(
        &self,
        caller: &Caller,
        filter: &PaymentFilter,
        sort: Sort<PaymentSortKey>,
    ) -> AppResult<Vec<PaymentView>> {
        caller.require(Capability::AdministrativeAccess)?;
        let payments = self
            .payments
            .list(filter, caller.chair_scope(), sort)
            .await?;

        let mut farmer_ids: Vec<i32> = payments.iter().map(|p| p.farmer_id).collect();
        farmer_ids.sort_unstable();
        farmer_ids.dedup();
        let farmers = self.farmers.find_many(&farmer_ids).await?;

        Ok(payments
            .into_iter()
            .map(|payment| PaymentView {
                farmer: farmers.get(&payment.farmer_id).cloned(),
                payment,
            })
            .collect())
    }

    pub async fn stats(&self, caller: &Caller) -> AppResult<PaymentStats> {
        caller.require(Capability::AdministrativeAccess)?;
        let scope = caller.chair_scope();
        let tallies = self.payments.tally_in_scope(scope).await?;

        let mut windows: [WindowTotals; 3] = Default::default();
        for (totals, window) in windows.iter_mut().zip(stats_windows(self.clock.today())) {
            let (count, sum) = self.payments.window_in_scope(scope, window).await?;
            *totals = WindowTotals { count, sum };
        }
        Ok(summarize_payments(&tallies, windows))
    }

    /// Loads a payment, refusing block chairs on other blocks.
    async fn reachable(&self, caller: &Caller, payment_id: i32) -> AppResult<(Payment, Farmer)> {
        let (payment, farmer, chair_id) = self
            .payments
            .find_with_block_chair(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("payment", payment_id))?;

        if !caller.chair_scope().contains_chaired(chair_id) {
            tracing::warn!(user_id = caller.user_id, payment_id, "Payment outside chaired block");
            return Err(AppError::forbidden(OTHER_BLOCK_PAYMENT));
        }
        Ok((payment, farmer))
    }

    /// The farmer a new payment is booked against; block chairs may only
    /// book against farmers of the block they chair.
    async fn payable_farmer(&self, caller: &Caller, farmer_id: i32) -> AppResult<Farmer> {
        let (farmer, chair_id) = self
            .farmers
            .find_with_block_chair(farmer_id)
            .await?
            .ok_or_else(|| AppError::validation("farmer", "Invalid farmer ID."))?;
        if !caller.chair_scope().contains_chaired(chair_id) {
            return Err(AppError::forbidden(OTHER_BLOCK_PAYMENT));
        }
        Ok(farmer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use std::str::FromStr;

    fn payment(id: i32, amount: &str, kind: PaymentType, paid: Date, verified: bool) -> Payment {
        Payment {
            id,
            farmer_id: 1,
            amount: BigDecimal::from_str(amount).unwrap(),
            payment_type: kind,
            description: String::new(),
            date_paid: paid.into(),
            method: PaymentMethod::Cash,
            reference_code: None,
            recorded_by: Some(1),
            timestamp: Timestamp::UNIX_EPOCH.into(),
            is_verified: verified,
            verified_by: None,
            verification_date: None,
            notes: None,
        }
    }

    fn changes(amount: &str, kind: PaymentType, description: &str) -> PaymentChangeset {
        PaymentChangeset {
            farmer_id: 1,
            amount: BigDecimal::from_str(amount).unwrap(),
            payment_type: kind,
            description: description.to_string(),
            date_paid: date(2025, 1, 1).into(),
            method: PaymentMethod::Airtel,
            reference_code: None,
            notes: None,
        }
    }

    #[test]
    fn test_fine_requires_description() {
        match check_payment(&changes("500", PaymentType::Fine, "  ")) {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "description");
                assert_eq!(reason, FINE_NEEDS_DESCRIPTION);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(check_payment(&changes("500", PaymentType::Fine, "Late for assembly")).is_ok());
        assert!(check_payment(&changes("500", PaymentType::PlotFee, "")).is_ok());
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(check_payment(&changes("0", PaymentType::PlotFee, "")).is_err());
        assert!(check_payment(&changes("-10", PaymentType::PlotFee, "")).is_err());
        assert!(check_payment(&changes("0.01", PaymentType::PlotFee, "")).is_ok());
    }

    #[test]
    fn test_long_description_rejected() {
        let long = "x".repeat(121);
        assert!(check_payment(&changes("5", PaymentType::Other, &long)).is_err());
    }

    fn tally(kind: PaymentType, is_verified: bool, count: i64, amount: i64) -> LedgerTally {
        LedgerTally {
            payment_type: kind,
            is_verified,
            count,
            amount: BigDecimal::from(amount),
        }
    }

    #[test]
    fn test_stats_windows_end_today() {
        let today = date(2025, 3, 31);
        let [day, week, month] = stats_windows(today);

        assert_eq!(day.from, today);
        assert_eq!(day.until, Some(today));
        assert_eq!(week.from, date(2025, 3, 24));
        assert_eq!(week.until, None);
        assert_eq!(month.from, date(2025, 3, 1));
        assert_eq!(month.until, None);
    }

    #[test]
    fn test_summary_folds_tallies() {
        let tallies = vec![
            tally(PaymentType::Fine, false, 2, 75),
            tally(PaymentType::PlotFee, true, 1, 100),
            tally(PaymentType::Contribution, true, 1, 10),
            tally(PaymentType::Fine, true, 1, 5),
        ];
        let week = WindowTotals {
            count: 2,
            sum: Some(BigDecimal::from(150)),
        };

        let stats = summarize_payments(
            &tallies,
            [WindowTotals::default(), week.clone(), WindowTotals::default()],
        );

        assert_eq!(stats.total_payments, 5);
        assert_eq!(stats.total_amount, BigDecimal::from(190));
        assert_eq!(stats.last_week, week);
        assert_eq!(stats.today, WindowTotals::default());
        assert_eq!(stats.verified, 3);
        assert_eq!(stats.unverified, 2);

        let kinds: Vec<(PaymentType, i64, BigDecimal)> = stats
            .by_type
            .iter()
            .map(|t| (t.payment_type, t.count, t.amount.clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (PaymentType::PlotFee, 1, BigDecimal::from(100)),
                (PaymentType::Fine, 3, BigDecimal::from(80)),
                (PaymentType::Contribution, 1, BigDecimal::from(10)),
            ]
        );
    }

    #[test]
    fn test_empty_ledger_summary() {
        let stats = summarize_payments(&[], Default::default());
        assert_eq!(stats.total_payments, 0);
        assert_eq!(stats.today, WindowTotals::default());
        assert_eq!(stats.total_amount, BigDecimal::zero());
        assert!(stats.by_type.is_empty());
    }

    #[test]
    fn test_first_verification_returns_payment() {
        let mut verified = payment(4, "100", PaymentType::PlotFee, date(2025, 1, 2), true);
        verified.verified_by = Some(9);

        let payment = verified_payment(VerifyOutcome::Verified(verified), 4, 9).unwrap();
        assert_eq!(payment.id, 4);
        assert_eq!(payment.verified_by, Some(9));
    }

    #[test]
    fn test_second_verification_is_refused() {
        match verified_payment(VerifyOutcome::AlreadyVerified, 4, 9) {
            Err(AppError::BadRequest { message }) => assert_eq!(message, ALREADY_VERIFIED),
            other => panic!("Expected BadRequest, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn test_verifying_missing_payment_is_not_found() {
        match verified_payment(VerifyOutcome::Missing, 4, 9) {
            Err(AppError::NotFound { entity, value, .. }) => {
                assert_eq!(entity, "payment");
                assert_eq!(value, "4");
            }
            other => panic!("Expected NotFound, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn test_patch_keeps_stored_values() {
        let current = payment(1, "100", PaymentType::PlotFee, date(2025, 1, 2), false);
        let changes = PaymentPatch {
            amount: Some(BigDecimal::from(120)),
            ..Default::default()
        }
        .apply(&current);

        assert_eq!(changes.amount, BigDecimal::from(120));
        assert_eq!(changes.farmer_id, 1);
        assert_eq!(changes.date_paid.to_jiff(), date(2025, 1, 2));
    }
}
