//! Locations, blocks and sections.

use std::collections::HashMap;

use crate::access::{Caller, Capability};
use crate::error::{AppError, AppResult};
use crate::models::{Block, Location, NewBlock, NewLocation, NewSection, Section};
use crate::repositories::OrgRepository;

/// A section together with the name of the block it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub section: Section,
    pub block_name: String,
}

/// Id → name lookups for the org hierarchy, loaded in one batch per listing.
#[derive(Debug, Clone, Default)]
pub struct OrgNames {
    locations: HashMap<i32, String>,
    blocks: HashMap<i32, String>,
    sections: HashMap<i32, String>,
}

impl OrgNames {
    pub async fn load(
        orgs: &OrgRepository,
        location_ids: &[i32],
        block_ids: &[i32],
        section_ids: &[i32],
    ) -> AppResult<Self> {
        Ok(Self {
            locations: orgs.location_names(&dedup(location_ids)).await?,
            blocks: orgs.block_names(&dedup(block_ids)).await?,
            sections: orgs.section_names(&dedup(section_ids)).await?,
        })
    }

    pub fn location(&self, id: Option<i32>) -> Option<String> {
        id.and_then(|id| self.locations.get(&id).cloned())
    }

    pub fn block(&self, id: Option<i32>) -> Option<String> {
        id.and_then(|id| self.blocks.get(&id).cloned())
    }

    pub fn section(&self, id: Option<i32>) -> Option<String> {
        id.and_then(|id| self.sections.get(&id).cloned())
    }
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Clone)]
pub struct OrgService {
    orgs: OrgRepository,
}

impl OrgService {
    pub fn new(orgs: OrgRepository) -> Self {
        Self { orgs }
    }

    pub async fn list_locations(&self, caller: &Caller) -> AppResult<Vec<Location>> {
        caller.require(Capability::AdministrativeAccess)?;
        self.orgs.list_locations().await
    }

    pub async fn create_location(&self, caller: &Caller, name: String) -> AppResult<Location> {
        caller.require(Capability::ManageOrgData)?;
        let location = self
            .orgs
            .create_location(NewLocation {
                name: required_name(name)?,
            })
            .await?;
        tracing::info!(location_id = location.id, name = %location.name, "Location created");
        Ok(location)
    }

    pub async fn list_blocks(&self, caller: &Caller) -> AppResult<Vec<Block>> {
        caller.require(Capability::AdministrativeAccess)?;
        self.orgs.list_blocks().await
    }

    pub async fn create_block(&self, caller: &Caller, name: String) -> AppResult<Block> {
        caller.require(Capability::ManageOrgData)?;
        let block = self
            .orgs
            .create_block(NewBlock {
                name: required_name(name)?,
            })
            .await?;
        tracing::info!(block_id = block.id, name = %block.name, "Block created");
        Ok(block)
    }

    pub async fn list_sections(
        &self,
        caller: &Caller,
        block_id: Option<i32>,
    ) -> AppResult<Vec<SectionView>> {
        caller.require(Capability::AdministrativeAccess)?;
        let rows = self.orgs.list_sections(block_id).await?;
        Ok(rows
            .into_iter()
            .map(|(section, block_name)| SectionView {
                section,
                block_name,
            })
            .collect())
    }

    pub async fn create_section(
        &self,
        caller: &Caller,
        name: String,
        block_id: i32,
    ) -> AppResult<SectionView> {
        caller.require(Capability::ManageOrgData)?;
        let block = self
            .orgs
            .find_block(block_id)
            .await?
            .ok_or_else(|| AppError::validation("block", "Invalid block ID."))?;

        let section = self
            .orgs
            .create_section(NewSection {
                name: required_name(name)?,
                block_id,
            })
            .await?;
        tracing::info!(section_id = section.id, block_id, "Section created");

        Ok(SectionView {
            section,
            block_name: block.name,
        })
    }
}

fn required_name(name: String) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("name", "This field may not be blank."));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_trimmed_and_required() {
        assert_eq!(required_name("  Block A ".to_string()).unwrap(), "Block A");
        assert!(matches!(
            required_name("   ".to_string()),
            Err(AppError::Validation { field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_lookup_ignores_missing_ids() {
        let names = OrgNames {
            blocks: HashMap::from([(1, "Block A".to_string())]),
            ..Default::default()
        };
        assert_eq!(names.block(Some(1)).as_deref(), Some("Block A"));
        assert_eq!(names.block(Some(2)), None);
        assert_eq!(names.block(None), None);
        assert_eq!(names.section(Some(1)), None);
    }

    #[test]
    fn test_dedup_sorts_ids() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
    }
}
