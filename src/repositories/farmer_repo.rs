//! Farmer repository.
//!
//! Registration numbers are allocated under a transaction-scoped advisory lock
//! so concurrent creations serialize on the sequence, and the single-active-
//! chairperson rule is checked inside the same transaction as the write. The
//! unique constraints in the schema back both up.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::dsl::{count_star, max};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::access::RecordScope;
use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{
    Farmer, FarmerChangeset, FarmerRole, NewFarmer, format_registration_number,
    next_registration_sequence,
};
use crate::schema::{blocks, farmers, payments, sections};

/// Key of the advisory lock guarding registration number allocation.
const REGISTRATION_LOCK_KEY: i64 = 0x4c52_5300;

pub const CHAIRPERSON_TAKEN: &str = "There is already an active chairperson for this block.";

/// Listing filters for farmers.
#[derive(Debug, Clone, Default)]
pub struct FarmerFilter {
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub location_id: Option<i32>,
    pub search: Option<String>,
}

/// Total plots of active farmers in one block/section pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotsRow {
    pub block_name: String,
    pub section_name: String,
    pub total_plots: i64,
}

#[derive(Clone)]
pub struct FarmerRepository {
    pool: AsyncDbPool,
}

impl FarmerRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Inserts a farmer with the next registration number.
    pub async fn create(&self, changes: FarmerChangeset) -> Result<Farmer, AppError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
                    .bind::<BigInt, _>(REGISTRATION_LOCK_KEY)
                    .execute(conn)
                    .await?;

                if changes.role == FarmerRole::Chairperson {
                    Self::ensure_no_active_chair(conn, changes.block_id, None).await?;
                }

                let max_id: Option<i32> = farmers::table.select(max(farmers::id)).first(conn).await?;
                let registration_number =
                    format_registration_number(next_registration_sequence(max_id));

                diesel::insert_into(farmers::table)
                    .values(&NewFarmer::from_changeset(changes, registration_number))
                    .returning(Farmer::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(AppError::from)
            }
            .scope_boxed()
        })
        .await
    }

    /// Writes the full changeset; the registration number is never part of it.
    pub async fn update(&self, farmer_id: i32, changes: FarmerChangeset) -> Result<Farmer, AppError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let is_active: bool = farmers::table
                    .filter(farmers::id.eq(farmer_id))
                    .select(farmers::is_active)
                    .for_update()
                    .first(conn)
                    .await?;

                if is_active && changes.role == FarmerRole::Chairperson {
                    Self::ensure_no_active_chair(conn, changes.block_id, Some(farmer_id)).await?;
                }

                diesel::update(farmers::table.filter(farmers::id.eq(farmer_id)))
                    .set(&changes.recompute_total())
                    .returning(Farmer::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(AppError::from)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.or_not_found("farmer", farmer_id))
    }

    pub async fn find_by_id(&self, farmer_id: i32) -> Result<Option<Farmer>, AppError> {
        let mut conn = self.pool.get().await?;

        farmers::table
            .filter(farmers::id.eq(farmer_id))
            .select(Farmer::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn find_many(&self, ids: &[i32]) -> Result<HashMap<i32, Farmer>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await?;

        let rows = farmers::table
            .filter(farmers::id.eq_any(ids))
            .select(Farmer::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(|farmer| (farmer.id, farmer)).collect())
    }

    /// The farmer together with the designated chair of the farmer's block.
    pub async fn find_with_block_chair(
        &self,
        farmer_id: i32,
    ) -> Result<Option<(Farmer, Option<i32>)>, AppError> {
        let mut conn = self.pool.get().await?;

        farmers::table
            .inner_join(blocks::table)
            .filter(farmers::id.eq(farmer_id))
            .select((Farmer::as_select(), blocks::chair_id))
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// One page of farmers matching `filter` within `scope`, newest first,
    /// with the total number of matches.
    pub async fn list_paginated(
        &self,
        filter: &FarmerFilter,
        scope: RecordScope,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Farmer>, i64), AppError> {
        let mut conn = self.pool.get().await?;

        let total: i64 = Self::filtered(filter, scope)
            .select(count_star())
            .first(&mut conn)
            .await?;

        let rows = Self::filtered(filter, scope)
            .order((farmers::date_registered.desc(), farmers::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(Farmer::as_select())
            .load(&mut conn)
            .await?;

        Ok((rows, total))
    }

    /// Soft delete. Returns the number of rows marked inactive (0 or 1).
    pub async fn deactivate(&self, farmer_id: i32) -> Result<usize, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(farmers::table.filter(farmers::id.eq(farmer_id)))
            .set(farmers::is_active.eq(false))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn count_active(&self) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        farmers::table
            .filter(farmers::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Active farmers with the total of all their recorded payments and the
    /// names of their block and section.
    pub async fn active_with_paid_totals(
        &self,
    ) -> Result<Vec<(Farmer, String, String, Option<BigDecimal>)>, AppError> {
        let mut conn = self.pool.get().await?;

        let active: Vec<(Farmer, String, String)> = farmers::table
            .inner_join(blocks::table)
            .inner_join(sections::table)
            .filter(farmers::is_active.eq(true))
            .select((Farmer::as_select(), blocks::name, sections::name))
            .load(&mut conn)
            .await?;

        let ids: Vec<i32> = active.iter().map(|(farmer, _, _)| farmer.id).collect();
        let paid: Vec<(i32, Option<BigDecimal>)> = payments::table
            .filter(payments::farmer_id.eq_any(&ids))
            .group_by(payments::farmer_id)
            .select((payments::farmer_id, diesel::dsl::sum(payments::amount)))
            .load(&mut conn)
            .await?;
        let paid: HashMap<i32, Option<BigDecimal>> = paid.into_iter().collect();

        Ok(active
            .into_iter()
            .map(|(farmer, block, section)| {
                let total = paid.get(&farmer.id).cloned().flatten();
                (farmer, block, section, total)
            })
            .collect())
    }

    /// Plots of active farmers summed per (block, section), ordered by names.
    pub async fn plots_summary(&self) -> Result<Vec<PlotsRow>, AppError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, String, Option<i64>)> = farmers::table
            .inner_join(blocks::table)
            .inner_join(sections::table)
            .filter(farmers::is_active.eq(true))
            .group_by((blocks::name, sections::name))
            .select((blocks::name, sections::name, diesel::dsl::sum(farmers::number_of_plots)))
            .order((blocks::name.asc(), sections::name.asc()))
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(block_name, section_name, total)| PlotsRow {
                block_name,
                section_name,
                total_plots: total.unwrap_or(0),
            })
            .collect())
    }

    fn filtered<'a>(filter: &'a FarmerFilter, scope: RecordScope) -> farmers::BoxedQuery<'a, Pg> {
        let mut query = farmers::table.into_boxed();

        match scope {
            RecordScope::All => {}
            RecordScope::BlockSection {
                block_id,
                section_id,
            } => {
                query = query
                    .filter(farmers::block_id.eq(block_id))
                    .filter(farmers::section_id.eq(section_id));
            }
            RecordScope::ChairedBy(user_id) => {
                query = query.filter(
                    farmers::block_id.eq_any(
                        blocks::table
                            .filter(blocks::chair_id.eq(user_id))
                            .select(blocks::id),
                    ),
                );
            }
        }

        if let Some(block_id) = filter.block_id {
            query = query.filter(farmers::block_id.eq(block_id));
        }
        if let Some(section_id) = filter.section_id {
            query = query.filter(farmers::section_id.eq(section_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(farmers::location_id.eq(location_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                farmers::first_name
                    .ilike(pattern.clone())
                    .or(farmers::last_name.ilike(pattern.clone()))
                    .or(farmers::phone_number.ilike(pattern.clone()))
                    .or(farmers::registration_number.ilike(pattern)),
            );
        }

        query
    }

    async fn ensure_no_active_chair(
        conn: &mut AsyncPgConnection,
        block_id: i32,
        exclude: Option<i32>,
    ) -> Result<(), AppError> {
        let mut query = farmers::table
            .filter(farmers::block_id.eq(block_id))
            .filter(farmers::role.eq(FarmerRole::Chairperson))
            .filter(farmers::is_active.eq(true))
            .into_boxed();
        if let Some(farmer_id) = exclude {
            query = query.filter(farmers::id.ne(farmer_id));
        }

        let existing: i64 = query.count().get_result(conn).await?;
        if existing > 0 {
            return Err(AppError::validation("role", CHAIRPERSON_TAKEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plots_are_grouped_by_block_and_section_name() {
        let query = farmers::table
            .inner_join(blocks::table)
            .inner_join(sections::table)
            .filter(farmers::is_active.eq(true))
            .group_by((blocks::name, sections::name))
            .select((blocks::name, sections::name, diesel::dsl::sum(farmers::number_of_plots)));

        let sql = diesel::debug_query::<Pg, _>(&query).to_string();
        assert!(sql.contains(r#"GROUP BY "blocks"."name", "sections"."name""#), "{sql}");
    }
}
