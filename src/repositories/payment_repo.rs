//! Payment ledger repository.

use bigdecimal::BigDecimal;
use diesel::dsl::{count_star, sum};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_async::RunQueryDsl;
use jiff_diesel::{Date, Timestamp};

use crate::access::RecordScope;
use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Farmer, NewPayment, Payment, PaymentChangeset, PaymentMethod, PaymentType};
use crate::repositories::sort::{PaymentSortKey, Sort};
use crate::schema::{blocks, farmers, payments};

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub farmer_id: Option<i32>,
    pub payment_type: Option<PaymentType>,
    pub method: Option<PaymentMethod>,
    pub is_verified: Option<bool>,
    pub min_amount: Option<BigDecimal>,
    pub max_amount: Option<BigDecimal>,
    pub paid_after: Option<Date>,
    pub paid_before: Option<Date>,
    pub search: Option<String>,
}

/// Payments dated on or after `from`, and on or before `until` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaidWindow {
    pub from: jiff::civil::Date,
    pub until: Option<jiff::civil::Date>,
}

/// Count and amount of the payments sharing one type and verification state.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTally {
    pub payment_type: PaymentType,
    pub is_verified: bool,
    pub count: i64,
    pub amount: BigDecimal,
}

type ScopeCondition = Box<dyn BoxableExpression<payments::table, Pg, SqlType = Bool>>;

/// Outcome of an attempt to verify a payment.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified(Payment),
    AlreadyVerified,
    Missing,
}

#[derive(Clone)]
pub struct PaymentRepository {
    pool: AsyncDbPool,
}

impl PaymentRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_payment: NewPayment) -> Result<Payment, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(payments::table)
            .values(&new_payment)
            .returning(Payment::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// The payment, its farmer, and the designated chair of the farmer's block.
    pub async fn find_with_block_chair(
        &self,
        payment_id: i32,
    ) -> Result<Option<(Payment, Farmer, Option<i32>)>, AppError> {
        let mut conn = self.pool.get().await?;

        payments::table
            .inner_join(farmers::table.inner_join(blocks::table))
            .filter(payments::id.eq(payment_id))
            .select((Payment::as_select(), Farmer::as_select(), blocks::chair_id))
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn update(
        &self,
        payment_id: i32,
        changes: PaymentChangeset,
    ) -> Result<Payment, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(payments::table.filter(payments::id.eq(payment_id)))
            .set(&changes)
            .returning(Payment::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| AppError::from(error).or_not_found("payment", payment_id))
    }

    pub async fn delete(&self, payment_id: i32) -> Result<usize, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(payments::table.filter(payments::id.eq(payment_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Marks the payment verified only if it is not verified yet, so two
    /// concurrent verifications cannot both succeed.
    pub async fn verify(
        &self,
        payment_id: i32,
        verifier_id: i32,
        now: Timestamp,
    ) -> Result<VerifyOutcome, AppError> {
        let mut conn = self.pool.get().await?;

        let updated = diesel::update(
            payments::table
                .filter(payments::id.eq(payment_id))
                .filter(payments::is_verified.eq(false)),
        )
        .set((
            payments::is_verified.eq(true),
            payments::verified_by.eq(Some(verifier_id)),
            payments::verification_date.eq(Some(now)),
        ))
        .returning(Payment::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

        if let Some(payment) = updated {
            return Ok(VerifyOutcome::Verified(payment));
        }

        let exists: i64 = payments::table
            .filter(payments::id.eq(payment_id))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(if exists > 0 {
            VerifyOutcome::AlreadyVerified
        } else {
            VerifyOutcome::Missing
        })
    }

    pub async fn list(
        &self,
        filter: &PaymentFilter,
        scope: RecordScope,
        sort: Sort<PaymentSortKey>,
    ) -> Result<Vec<Payment>, AppError> {
        let mut conn = self.pool.get().await?;

        let query = Self::filtered(filter, scope);
        let query = match (sort.key, sort.descending) {
            (PaymentSortKey::DatePaid, false) => query.order(payments::date_paid.asc()),
            (PaymentSortKey::DatePaid, true) => query.order(payments::date_paid.desc()),
            (PaymentSortKey::Amount, false) => query.order(payments::amount.asc()),
            (PaymentSortKey::Amount, true) => query.order(payments::amount.desc()),
            (PaymentSortKey::Timestamp, false) => query.order(payments::timestamp.asc()),
            (PaymentSortKey::Timestamp, true) => query.order(payments::timestamp.desc()),
        };

        query
            .then_order_by(payments::id.desc())
            .select(Payment::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Payments in scope grouped by type and verification state.
    pub async fn tally_in_scope(&self, scope: RecordScope) -> Result<Vec<LedgerTally>, AppError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(PaymentType, bool, i64, Option<BigDecimal>)> = payments::table
            .filter(Self::scope_condition(scope))
            .group_by((payments::payment_type, payments::is_verified))
            .select((
                payments::payment_type,
                payments::is_verified,
                count_star(),
                sum(payments::amount),
            ))
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(payment_type, is_verified, count, amount)| LedgerTally {
                payment_type,
                is_verified,
                count,
                amount: amount.unwrap_or_default(),
            })
            .collect())
    }

    /// Count and sum of the payments in scope paid inside `window`.
    pub async fn window_in_scope(
        &self,
        scope: RecordScope,
        window: PaidWindow,
    ) -> Result<(i64, Option<BigDecimal>), AppError> {
        let mut conn = self.pool.get().await?;

        let paid_inside: ScopeCondition = match window.until {
            Some(until) => Box::new(
                payments::date_paid.between(Date::from(window.from), Date::from(until)),
            ),
            None => Box::new(payments::date_paid.ge(Date::from(window.from))),
        };

        payments::table
            .filter(Self::scope_condition(scope))
            .filter(paid_inside)
            .select((count_star(), sum(payments::amount)))
            .first(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Sum of all payments recorded as fines.
    pub async fn sum_fines(&self) -> Result<BigDecimal, AppError> {
        let mut conn = self.pool.get().await?;

        let total: Option<BigDecimal> = payments::table
            .filter(payments::payment_type.eq(PaymentType::Fine))
            .select(sum(payments::amount))
            .first(&mut conn)
            .await?;
        Ok(total.unwrap_or_default())
    }

    fn filtered<'a>(filter: &'a PaymentFilter, scope: RecordScope) -> payments::BoxedQuery<'a, Pg> {
        let mut query = payments::table
            .into_boxed()
            .filter(Self::scope_condition(scope));

        if let Some(farmer_id) = filter.farmer_id {
            query = query.filter(payments::farmer_id.eq(farmer_id));
        }
        if let Some(payment_type) = filter.payment_type {
            query = query.filter(payments::payment_type.eq(payment_type));
        }
        if let Some(method) = filter.method {
            query = query.filter(payments::method.eq(method));
        }
        if let Some(is_verified) = filter.is_verified {
            query = query.filter(payments::is_verified.eq(is_verified));
        }
        if let Some(min) = &filter.min_amount {
            query = query.filter(payments::amount.ge(min));
        }
        if let Some(max) = &filter.max_amount {
            query = query.filter(payments::amount.le(max));
        }
        if let Some(after) = filter.paid_after {
            query = query.filter(payments::date_paid.ge(after));
        }
        if let Some(before) = filter.paid_before {
            query = query.filter(payments::date_paid.le(before));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            let matching_farmers = farmers::table
                .filter(
                    farmers::first_name
                        .ilike(pattern.clone())
                        .or(farmers::last_name.ilike(pattern.clone())),
                )
                .select(farmers::id);
            query = query.filter(
                payments::farmer_id
                    .eq_any(matching_farmers)
                    .or(payments::reference_code.assume_not_null().ilike(pattern)),
            );
        }

        query
    }

    /// Restricts payments to farmers inside `scope`.
    fn scope_condition(scope: RecordScope) -> ScopeCondition {
        match scope {
            RecordScope::All => Box::new(true.into_sql::<Bool>()),
            RecordScope::ChairedBy(user_id) => Box::new(
                payments::farmer_id.eq_any(
                    farmers::table
                        .filter(
                            farmers::block_id.eq_any(
                                blocks::table
                                    .filter(blocks::chair_id.eq(user_id))
                                    .select(blocks::id),
                            ),
                        )
                        .select(farmers::id),
                ),
            ),
            RecordScope::BlockSection {
                block_id,
                section_id,
            } => Box::new(
                payments::farmer_id.eq_any(
                    farmers::table
                        .filter(farmers::block_id.eq(block_id))
                        .filter(farmers::section_id.eq(section_id))
                        .select(farmers::id),
                ),
            ),
        }
    }
}
