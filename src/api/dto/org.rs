//! Locations, blocks and sections.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Block, Location};
use crate::services::SectionView;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Limphasa")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Block A")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Section 1")]
    pub name: String,
    /// Owning block id
    pub block: i32,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SectionListQuery {
    pub block_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlockResponse {
    pub id: i32,
    pub name: String,
    /// User designated as the block's chair
    pub chair: Option<i32>,
}

impl From<Block> for BlockResponse {
    fn from(block: Block) -> Self {
        Self {
            id: block.id,
            name: block.name,
            chair: block.chair_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionResponse {
    pub id: i32,
    pub name: String,
    pub block: i32,
    pub block_name: String,
}

impl From<SectionView> for SectionResponse {
    fn from(view: SectionView) -> Self {
        Self {
            id: view.section.id,
            name: view.section.name,
            block: view.section.block_id,
            block_name: view.block_name,
        }
    }
}
