//! User repository for async database operations.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewUser, Role, UpdateUser, User};
use crate::repositories::OrgRepository;
use crate::schema::users;

/// User repository holding an async connection pool.
#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn find_by_username(&self, name: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(name))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// All users, most recently joined first.
    pub async fn list_newest_first(&self) -> Result<Vec<User>, AppError> {
        let mut conn = self.pool.get().await?;

        users::table
            .order((users::date_joined.desc(), users::id.desc()))
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_many(&self, ids: &[i32]) -> Result<HashMap<i32, User>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await?;

        let rows = users::table
            .filter(users::id.eq_any(ids))
            .select(User::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(|user| (user.id, user)).collect())
    }

    /// Applies an update and keeps the block's designated chair in step with
    /// the user's role, atomically.
    pub async fn update_with_assignment(
        &self,
        user_id: i32,
        update_data: UpdateUser,
    ) -> Result<User, AppError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let user = if update_data.is_empty() {
                    users::table
                        .filter(users::id.eq(user_id))
                        .select(User::as_select())
                        .first(conn)
                        .await?
                } else {
                    diesel::update(users::table.filter(users::id.eq(user_id)))
                        .set(&update_data)
                        .returning(User::as_returning())
                        .get_result(conn)
                        .await?
                };

                let chaired_block = match user.role {
                    Role::BlockChair => user.block_id,
                    _ => None,
                };
                OrgRepository::designate_chair_in(conn, user.id, chaired_block).await?;

                Ok(user)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.or_not_found("user", user_id))
    }
}
