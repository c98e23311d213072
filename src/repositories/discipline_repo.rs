//! Discipline case repository.

use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff_diesel::{Date, Timestamp};

use crate::access::RecordScope;
use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{
    CaseStatus, DisciplineCase, DisciplineCaseChangeset, NewDisciplineCase, OffenceType, Severity,
};
use crate::repositories::sort::{CaseSortKey, Sort};
use crate::schema::{blocks, discipline_cases, farmers};

#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub offence_type: Option<OffenceType>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub reported_by: Option<i32>,
    pub reported_after: Option<Timestamp>,
    pub reported_before: Option<Timestamp>,
    pub incident_after: Option<Date>,
    pub incident_before: Option<Date>,
    pub min_penalty_points: Option<i32>,
    pub max_penalty_points: Option<i32>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct DisciplineRepository {
    pool: AsyncDbPool,
}

impl DisciplineRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_case: NewDisciplineCase) -> Result<DisciplineCase, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(discipline_cases::table)
            .values(&new_case)
            .returning(DisciplineCase::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, case_id: i32) -> Result<Option<DisciplineCase>, AppError> {
        let mut conn = self.pool.get().await?;

        discipline_cases::table
            .filter(discipline_cases::id.eq(case_id))
            .select(DisciplineCase::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Locks the case row, derives the changes from its current state with
    /// `plan`, and writes them in one transaction.
    pub async fn modify<F>(&self, case_id: i32, plan: F) -> Result<DisciplineCase, AppError>
    where
        F: FnOnce(&DisciplineCase) -> Result<DisciplineCaseChangeset, AppError> + Send + 'static,
    {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let current = discipline_cases::table
                    .filter(discipline_cases::id.eq(case_id))
                    .select(DisciplineCase::as_select())
                    .for_update()
                    .first(conn)
                    .await?;

                let changes = plan(&current)?;

                diesel::update(discipline_cases::table.filter(discipline_cases::id.eq(case_id)))
                    .set(&changes)
                    .returning(DisciplineCase::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(AppError::from)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.or_not_found("discipline case", case_id))
    }

    pub async fn delete(&self, case_id: i32) -> Result<usize, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(discipline_cases::table.filter(discipline_cases::id.eq(case_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn list(
        &self,
        filter: &CaseFilter,
        scope: RecordScope,
        sort: Sort<CaseSortKey>,
    ) -> Result<Vec<DisciplineCase>, AppError> {
        let mut conn = self.pool.get().await?;

        let query = Self::filtered(filter, scope);
        let query = match (sort.key, sort.descending) {
            (CaseSortKey::DateReported, false) => query.order(discipline_cases::date_reported.asc()),
            (CaseSortKey::DateReported, true) => query.order(discipline_cases::date_reported.desc()),
            (CaseSortKey::Severity, false) => query.order(discipline_cases::severity.asc()),
            (CaseSortKey::Severity, true) => query.order(discipline_cases::severity.desc()),
            (CaseSortKey::PenaltyPoints, false) => query.order(discipline_cases::penalty_points.asc()),
            (CaseSortKey::PenaltyPoints, true) => query.order(discipline_cases::penalty_points.desc()),
        };

        query
            .then_order_by(discipline_cases::id.desc())
            .select(DisciplineCase::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Case counts per (status, severity) within the scope.
    pub async fn count_by_status_and_severity(
        &self,
        scope: RecordScope,
    ) -> Result<Vec<(CaseStatus, Severity, i64)>, AppError> {
        let mut conn = self.pool.get().await?;

        let rows = match scope {
            RecordScope::ChairedBy(user_id) => {
                discipline_cases::table
                    .filter(discipline_cases::block_id.eq_any(
                        blocks::table
                            .filter(blocks::chair_id.eq(user_id))
                            .select(blocks::id.nullable()),
                    ))
                    .group_by((discipline_cases::status, discipline_cases::severity))
                    .select((discipline_cases::status, discipline_cases::severity, count_star()))
                    .load(&mut conn)
                    .await?
            }
            RecordScope::BlockSection {
                block_id,
                section_id,
            } => {
                discipline_cases::table
                    .filter(discipline_cases::block_id.eq(block_id))
                    .filter(discipline_cases::section_id.eq(section_id))
                    .group_by((discipline_cases::status, discipline_cases::severity))
                    .select((discipline_cases::status, discipline_cases::severity, count_star()))
                    .load(&mut conn)
                    .await?
            }
            RecordScope::All => {
                discipline_cases::table
                    .group_by((discipline_cases::status, discipline_cases::severity))
                    .select((discipline_cases::status, discipline_cases::severity, count_star()))
                    .load(&mut conn)
                    .await?
            }
        };
        Ok(rows)
    }

    fn filtered<'a>(
        filter: &'a CaseFilter,
        scope: RecordScope,
    ) -> discipline_cases::BoxedQuery<'a, Pg> {
        let mut query = discipline_cases::table.into_boxed();

        match scope {
            RecordScope::All => {}
            RecordScope::ChairedBy(user_id) => {
                query = query.filter(
                    discipline_cases::block_id.eq_any(
                        blocks::table
                            .filter(blocks::chair_id.eq(user_id))
                            .select(blocks::id.nullable()),
                    ),
                );
            }
            RecordScope::BlockSection {
                block_id,
                section_id,
            } => {
                query = query
                    .filter(discipline_cases::block_id.eq(block_id))
                    .filter(discipline_cases::section_id.eq(section_id));
            }
        }

        if let Some(block_id) = filter.block_id {
            query = query.filter(discipline_cases::block_id.eq(block_id));
        }
        if let Some(section_id) = filter.section_id {
            query = query.filter(discipline_cases::section_id.eq(section_id));
        }
        if let Some(offence_type) = filter.offence_type {
            query = query.filter(discipline_cases::offence_type.eq(offence_type));
        }
        if let Some(status) = filter.status {
            query = query.filter(discipline_cases::status.eq(status));
        }
        if let Some(severity) = filter.severity {
            query = query.filter(discipline_cases::severity.eq(severity));
        }
        if let Some(reported_by) = filter.reported_by {
            query = query.filter(discipline_cases::reported_by.eq(reported_by));
        }
        if let Some(after) = filter.reported_after {
            query = query.filter(discipline_cases::date_reported.ge(after));
        }
        if let Some(before) = filter.reported_before {
            query = query.filter(discipline_cases::date_reported.lt(before));
        }
        if let Some(after) = filter.incident_after {
            query = query.filter(discipline_cases::date_incident.ge(after));
        }
        if let Some(before) = filter.incident_before {
            query = query.filter(discipline_cases::date_incident.le(before));
        }
        if let Some(min) = filter.min_penalty_points {
            query = query.filter(discipline_cases::penalty_points.ge(min));
        }
        if let Some(max) = filter.max_penalty_points {
            query = query.filter(discipline_cases::penalty_points.le(max));
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
                discipline_cases::farmer_id
                    .eq_any(matching_farmers)
                    .or(discipline_cases::offence_type.ilike(pattern)),
            );
        }

        query
    }
}
