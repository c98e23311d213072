//! Repository for the location → block → section hierarchy.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Block, Location, NewBlock, NewLocation, NewSection, Section};
use crate::schema::{blocks, locations, sections};

pub const BLOCK_ALREADY_CHAIRED: &str = "This block already has a designated chair.";

#[derive(Clone)]
pub struct OrgRepository {
    pool: AsyncDbPool,
}

impl OrgRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        let mut conn = self.pool.get().await?;

        locations::table
            .order(locations::id.asc())
            .select(Location::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn create_location(&self, new_location: NewLocation) -> Result<Location, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(locations::table)
            .values(&new_location)
            .returning(Location::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn list_blocks(&self) -> Result<Vec<Block>, AppError> {
        let mut conn = self.pool.get().await?;

        blocks::table
            .order(blocks::id.asc())
            .select(Block::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn create_block(&self, new_block: NewBlock) -> Result<Block, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(blocks::table)
            .values(&new_block)
            .returning(Block::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_block(&self, block_id: i32) -> Result<Option<Block>, AppError> {
        let mut conn = self.pool.get().await?;
        Self::find_block_in(&mut conn, block_id).await
    }

    /// Sections with the name of their block, optionally for one block only.
    pub async fn list_sections(
        &self,
        block_id: Option<i32>,
    ) -> Result<Vec<(Section, String)>, AppError> {
        let mut conn = self.pool.get().await?;

        let mut query = sections::table
            .inner_join(blocks::table)
            .select((Section::as_select(), blocks::name))
            .order(sections::id.asc())
            .into_boxed();
        if let Some(block_id) = block_id {
            query = query.filter(sections::block_id.eq(block_id));
        }

        query.load(&mut conn).await.map_err(AppError::from)
    }

    pub async fn create_section(&self, new_section: NewSection) -> Result<Section, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(sections::table)
            .values(&new_section)
            .returning(Section::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_section(&self, section_id: i32) -> Result<Option<Section>, AppError> {
        let mut conn = self.pool.get().await?;
        Self::find_section_in(&mut conn, section_id).await
    }

    /// The user designated as chair of `block_id`, if the block exists and has one.
    pub async fn find_block_chair(&self, block_id: i32) -> Result<Option<i32>, AppError> {
        let mut conn = self.pool.get().await?;

        blocks::table
            .filter(blocks::id.eq(block_id))
            .select(blocks::chair_id)
            .first::<Option<i32>>(&mut conn)
            .await
            .optional()
            .map(Option::flatten)
            .map_err(AppError::from)
    }

    pub async fn location_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await?;

        let rows: Vec<(i32, String)> = locations::table
            .filter(locations::id.eq_any(ids))
            .select((locations::id, locations::name))
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn block_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await?;

        let rows: Vec<(i32, String)> = blocks::table
            .filter(blocks::id.eq_any(ids))
            .select((blocks::id, blocks::name))
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn section_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await?;

        let rows: Vec<(i32, String)> = sections::table
            .filter(sections::id.eq_any(ids))
            .select((sections::id, sections::name))
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub(crate) async fn find_block_in(
        conn: &mut AsyncPgConnection,
        block_id: i32,
    ) -> Result<Option<Block>, AppError> {
        blocks::table
            .filter(blocks::id.eq(block_id))
            .select(Block::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub(crate) async fn find_section_in(
        conn: &mut AsyncPgConnection,
        section_id: i32,
    ) -> Result<Option<Section>, AppError> {
        sections::table
            .filter(sections::id.eq(section_id))
            .select(Section::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Makes `user_id` the designated chair of `block_id` only, or of no block
    /// when `block_id` is `None`. A block chaired by someone else is refused.
    pub(crate) async fn designate_chair_in(
        conn: &mut AsyncPgConnection,
        user_id: i32,
        block_id: Option<i32>,
    ) -> Result<(), AppError> {
        if let Some(block_id) = block_id {
            let current: Option<Option<i32>> = blocks::table
                .filter(blocks::id.eq(block_id))
                .select(blocks::chair_id)
                .for_update()
                .first(conn)
                .await
                .optional()?;
            ensure_chair_vacant(current.flatten(), user_id)?;
        }

        diesel::update(blocks::table.filter(blocks::chair_id.eq(user_id)))
            .set(blocks::chair_id.eq(None::<i32>))
            .execute(conn)
            .await?;

        if let Some(block_id) = block_id {
            diesel::update(blocks::table.filter(blocks::id.eq(block_id)))
                .set(blocks::chair_id.eq(Some(user_id)))
                .execute(conn)
                .await?;
        }
        Ok(())
    }
}

/// A block takes a new chair only while it has none, or when the chair is
/// being reassigned to the same user.
pub fn ensure_chair_vacant(current_chair: Option<i32>, user_id: i32) -> Result<(), AppError> {
    match current_chair {
        Some(chair_id) if chair_id != user_id => {
            Err(AppError::validation("block", BLOCK_ALREADY_CHAIRED))
        }
        _ => Ok(()),
    }
}
