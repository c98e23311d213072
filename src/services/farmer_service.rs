//! Farmer registry: placement validation, chairperson uniqueness and soft delete.

use bigdecimal::{BigDecimal, Zero};

use crate::access::{Caller, Capability};
use crate::error::{AppError, AppResult};
use crate::models::{Farmer, FarmerChangeset, FarmerRole, Gender, Section};
use crate::repositories::{FarmerFilter, FarmerRepository, OrgRepository};
use crate::services::org_service::OrgNames;

pub const SECTION_OUTSIDE_BLOCK: &str = "This section does not belong to the selected block.";

/// Everything needed to register a farmer. The total owed is never taken from
/// the client.
#[derive(Debug, Clone)]
pub struct FarmerInput {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub phone_number: String,
    pub email: Option<String>,
    pub number_of_plots: i32,
    pub amount_per_plot: BigDecimal,
    pub location_id: i32,
    pub block_id: i32,
    pub section_id: i32,
    pub role: FarmerRole,
    pub next_of_kin: Option<String>,
}

impl FarmerInput {
    fn into_changeset(self) -> FarmerChangeset {
        FarmerChangeset {
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            gender: self.gender,
            phone_number: self.phone_number,
            email: self.email,
            number_of_plots: self.number_of_plots,
            amount_per_plot: self.amount_per_plot,
            total_amount: BigDecimal::zero(),
            location_id: self.location_id,
            block_id: self.block_id,
            section_id: self.section_id,
            role: self.role,
            next_of_kin: self.next_of_kin,
        }
        .recompute_total()
    }
}

/// A partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct FarmerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub number_of_plots: Option<i32>,
    pub amount_per_plot: Option<BigDecimal>,
    pub location_id: Option<i32>,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
    pub role: Option<FarmerRole>,
    pub next_of_kin: Option<String>,
}

impl FarmerPatch {
    pub fn apply(self, mut changes: FarmerChangeset) -> FarmerChangeset {
        if let Some(v) = self.first_name {
            changes.first_name = v;
        }
        if let Some(v) = self.last_name {
            changes.last_name = v;
        }
        if let Some(v) = self.middle_name {
            changes.middle_name = Some(v);
        }
        if let Some(v) = self.gender {
            changes.gender = v;
        }
        if let Some(v) = self.phone_number {
            changes.phone_number = v;
        }
        if let Some(v) = self.email {
            changes.email = Some(v);
        }
        if let Some(v) = self.number_of_plots {
            changes.number_of_plots = v;
        }
        if let Some(v) = self.amount_per_plot {
            changes.amount_per_plot = v;
        }
        if let Some(v) = self.location_id {
            changes.location_id = v;
        }
        if let Some(v) = self.block_id {
            changes.block_id = v;
        }
        if let Some(v) = self.section_id {
            changes.section_id = v;
        }
        if let Some(v) = self.role {
            changes.role = v;
        }
        if let Some(v) = self.next_of_kin {
            changes.next_of_kin = Some(v);
        }
        changes.recompute_total()
    }
}

/// A farmer with the names of its placement.
#[derive(Debug, Clone)]
pub struct FarmerView {
    pub farmer: Farmer,
    pub location_name: Option<String>,
    pub block_name: Option<String>,
    pub section_name: Option<String>,
}

#[derive(Clone)]
pub struct FarmerService {
    farmers: FarmerRepository,
    orgs: OrgRepository,
}

impl FarmerService {
    pub fn new(farmers: FarmerRepository, orgs: OrgRepository) -> Self {
        Self { farmers, orgs }
    }

    pub async fn create(&self, caller: &Caller, input: FarmerInput) -> AppResult<FarmerView> {
        caller.require(Capability::ManageFarmers)?;
        let changes = input.into_changeset();
        self.validate(&changes).await?;

        let farmer = self.farmers.create(changes).await?;
        tracing::info!(
            farmer_id = farmer.id,
            registration_number = %farmer.registration_number,
            actor = caller.user_id,
            "Farmer registered"
        );
        self.view(farmer).await
    }

    /// Partial update. The registration number is never part of the changeset.
    pub async fn update(
        &self,
        caller: &Caller,
        farmer_id: i32,
        patch: FarmerPatch,
    ) -> AppResult<FarmerView> {
        caller.require(Capability::ManageFarmers)?;
        let current = self.find(farmer_id).await?;
        let changes = patch.apply(current.to_changeset());
        self.validate(&changes).await?;

        let farmer = self.farmers.update(farmer_id, changes).await?;
        tracing::info!(farmer_id, actor = caller.user_id, "Farmer updated");
        self.view(farmer).await
    }

    /// Marks the farmer inactive; the row and its history stay.
    pub async fn deactivate(&self, caller: &Caller, farmer_id: i32) -> AppResult<()> {
        caller.require(Capability::ManageFarmers)?;
        if self.farmers.deactivate(farmer_id).await? == 0 {
            return Err(AppError::not_found("farmer", farmer_id));
        }
        tracing::info!(farmer_id, actor = caller.user_id, "Farmer deactivated");
        Ok(())
    }

    /// Out-of-scope farmers are reported as missing.
    pub async fn get(&self, caller: &Caller, farmer_id: i32) -> AppResult<FarmerView> {
        caller.require(Capability::AdministrativeAccess)?;
        let scope = caller.placement_scope()?;
        let farmer = self.find(farmer_id).await?;
        if !scope.contains_placement(Some(farmer.block_id), Some(farmer.section_id)) {
            return Err(AppError::not_found("farmer", farmer_id));
        }
        self.view(farmer).await
    }

    pub async fn list(
        &self,
        caller: &Caller,
        filter: &FarmerFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<FarmerView>, i64)> {
        caller.require(Capability::AdministrativeAccess)?;
        let scope = caller.placement_scope()?;
        let (farmers, total) = self
            .farmers
            .list_paginated(filter, scope, offset, limit)
            .await?;
        Ok((self.views(farmers).await?, total))
    }

    async fn find(&self, farmer_id: i32) -> AppResult<Farmer> {
        self.farmers
            .find_by_id(farmer_id)
            .await?
            .ok_or_else(|| AppError::not_found("farmer", farmer_id))
    }

    async fn validate(&self, changes: &FarmerChangeset) -> AppResult<()> {
        check_terms(changes)?;
        let section = self.orgs.find_section(changes.section_id).await?;
        check_placement(section.as_ref(), changes.block_id)
    }

    async fn view(&self, farmer: Farmer) -> AppResult<FarmerView> {
        let names = OrgNames::load(
            &self.orgs,
            &[farmer.location_id],
            &[farmer.block_id],
            &[farmer.section_id],
        )
        .await?;
        Ok(attach_names(&names, farmer))
    }

    async fn views(&self, farmers: Vec<Farmer>) -> AppResult<Vec<FarmerView>> {
        let locations: Vec<i32> = farmers.iter().map(|f| f.location_id).collect();
        let blocks: Vec<i32> = farmers.iter().map(|f| f.block_id).collect();
        let sections: Vec<i32> = farmers.iter().map(|f| f.section_id).collect();
        let names = OrgNames::load(&self.orgs, &locations, &blocks, &sections).await?;

        Ok(farmers
            .into_iter()
            .map(|farmer| attach_names(&names, farmer))
            .collect())
    }
}

fn attach_names(names: &OrgNames, farmer: Farmer) -> FarmerView {
    FarmerView {
        location_name: names.location(Some(farmer.location_id)),
        block_name: names.block(Some(farmer.block_id)),
        section_name: names.section(Some(farmer.section_id)),
        farmer,
    }
}

/// The section must exist and sit inside the farmer's block.
pub fn check_placement(section: Option<&Section>, block_id: i32) -> AppResult<()> {
    match section {
        Some(section) if section.block_id == block_id => Ok(()),
        Some(_) => Err(AppError::validation("section", SECTION_OUTSIDE_BLOCK)),
        None => Err(AppError::validation("section", "Invalid section ID.")),
    }
}

pub fn check_terms(changes: &FarmerChangeset) -> AppResult<()> {
    if changes.number_of_plots < 1 {
        return Err(AppError::validation(
            "number_of_plots",
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    if changes.amount_per_plot < BigDecimal::zero() {
        return Err(AppError::validation(
            "amount_per_plot",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}
