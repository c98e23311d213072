//! Discipline cases.
//!
//! Block and section are copied from the farmer when a case is opened and are
//! never recomputed. Moving a case to `resolved` needs an `action_taken`
//! narrative; the first resolution stamps `resolution_date`, which later saves
//! leave alone.

use jiff::Timestamp;
use serde_json::Value as JsonValue;

use crate::access::{Caller, Capability, RecordScope};
use crate::error::{AppError, AppResult};
use crate::models::{
    CaseStatus, DisciplineCase, DisciplineCaseChangeset, Farmer, NewDisciplineCase, OffenceType,
    Severity,
};
use crate::repositories::{
    CaseFilter, CaseSortKey, DisciplineRepository, FarmerRepository, OrgRepository, Sort,
};

pub const ACTION_REQUIRED: &str = "This field is required when resolving a case.";
pub const OTHER_BLOCK_CASE: &str = "You can only access cases from your block";

pub const DEFAULT_CASE_SORT: Sort<CaseSortKey> = Sort {
    key: CaseSortKey::DateReported,
    descending: true,
};

#[derive(Debug, Clone)]
pub struct CaseInput {
    pub farmer_id: i32,
    pub date_incident: Option<jiff::civil::Date>,
    pub offence_type: OffenceType,
    pub offence_description: String,
    pub action_taken: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub penalty_points: i32,
    pub comment: String,
    pub evidence: JsonValue,
}

/// A partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CasePatch {
    pub date_incident: Option<jiff::civil::Date>,
    pub offence_type: Option<OffenceType>,
    pub offence_description: Option<String>,
    pub action_taken: Option<String>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub penalty_points: Option<i32>,
    pub comment: Option<String>,
    pub evidence: Option<JsonValue>,
}

/// Counters for the discipline overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseStats {
    pub total_cases: i64,
    pub open_cases: i64,
    pub resolved_cases: i64,
    pub serious_cases: i64,
}

impl CaseStats {
    pub fn tally(rows: &[(CaseStatus, Severity, i64)]) -> Self {
        rows.iter()
            .fold(Self::default(), |mut stats, (status, severity, count)| {
                stats.total_cases += count;
                match status {
                    CaseStatus::Open => stats.open_cases += count,
                    CaseStatus::Resolved => stats.resolved_cases += count,
                    _ => {}
                }
                if *severity == Severity::Serious {
                    stats.serious_cases += count;
                }
                stats
            })
    }
}

/// Whether a case may move from `from` to `to`.
///
/// Cases advance through open, investigating, hearing_scheduled and resolved,
/// possibly skipping steps. A resolved case can be closed or appealed, a closed
/// one appealed, and an appeal reopens the investigation.
pub fn transition_allowed(from: CaseStatus, to: CaseStatus) -> bool {
    use CaseStatus::*;

    if from == to {
        return true;
    }
    let stage = |status: CaseStatus| match status {
        Open => 0,
        Investigating => 1,
        HearingScheduled => 2,
        Resolved => 3,
        Closed | Appealed => 4,
    };
    match from {
        Open | Investigating | HearingScheduled => {
            matches!(to, Investigating | HearingScheduled | Resolved) && stage(to) > stage(from)
        }
        Resolved => matches!(to, Closed | Appealed),
        Closed => to == Appealed,
        Appealed => matches!(to, Investigating | HearingScheduled | Resolved),
    }
}

/// The row for a case opened by `caller` at `now`. Block and section are
/// copied from the farmer; a case opened as resolved is stamped as such.
pub fn new_case(
    input: CaseInput,
    farmer: &Farmer,
    caller: &Caller,
    now: Timestamp,
) -> NewDisciplineCase {
    let resolving = input.status == CaseStatus::Resolved;
    NewDisciplineCase {
        farmer_id: farmer.id,
        block_id: Some(farmer.block_id),
        section_id: Some(farmer.section_id),
        date_incident: input.date_incident.map(Into::into),
        offence_type: input.offence_type,
        offence_description: input.offence_description,
        action_taken: input.action_taken,
        status: input.status,
        severity: input.severity,
        penalty_points: input.penalty_points,
        comment: input.comment,
        reported_by: Some(caller.user_id),
        resolved_by: resolving.then_some(caller.user_id),
        resolution_date: resolving.then(|| now.into()),
        evidence: input.evidence,
    }
}

/// Builds the changeset for `patch` applied to `current` by `actor` at `now`.
pub fn plan_update(
    current: &DisciplineCase,
    patch: CasePatch,
    actor: i32,
    now: Timestamp,
) -> AppResult<DisciplineCaseChangeset> {
    let status = patch.status.unwrap_or(current.status);
    if !transition_allowed(current.status, status) {
        return Err(AppError::validation(
            "status",
            format!(
                "Cannot move a case from {} to {}.",
                current.status.label(),
                status.label()
            ),
        ));
    }

    let action_taken = patch
        .action_taken
        .as_deref()
        .unwrap_or(&current.action_taken);
    if status == CaseStatus::Resolved {
        require_action(action_taken)?;
    }

    let mut changes = DisciplineCaseChangeset {
        date_incident: patch.date_incident.map(|d| Some(d.into())),
        offence_type: patch.offence_type,
        offence_description: patch.offence_description,
        action_taken: patch.action_taken,
        status: patch.status,
        severity: patch.severity,
        penalty_points: patch.penalty_points,
        comment: patch.comment,
        evidence: patch.evidence,
        ..Default::default()
    };

    if status == CaseStatus::Resolved {
        if current.resolved_by.is_none() {
            changes.resolved_by = Some(Some(actor));
        }
        if current.resolution_date.is_none() {
            changes.resolution_date = Some(Some(now.into()));
        }
    }

    Ok(changes)
}

fn require_action(action_taken: &str) -> AppResult<()> {
    if action_taken.trim().is_empty() {
        return Err(AppError::validation("action_taken", ACTION_REQUIRED));
    }
    Ok(())
}

fn check_penalty(points: Option<i32>) -> AppResult<()> {
    if points.is_some_and(|p| p < 0) {
        return Err(AppError::validation(
            "penalty_points",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}

fn check_evidence(evidence: Option<&JsonValue>) -> AppResult<()> {
    if evidence.is_some_and(|e| !e.is_array()) {
        return Err(AppError::validation("evidence", "Expected a list of items."));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DisciplineService {
    cases: DisciplineRepository,
    farmers: FarmerRepository,
    orgs: OrgRepository,
}

impl DisciplineService {
    pub fn new(cases: DisciplineRepository, farmers: FarmerRepository, orgs: OrgRepository) -> Self {
        Self {
            cases,
            farmers,
            orgs,
        }
    }

    /// Opens a case against a farmer.
    pub async fn create(&self, caller: &Caller, input: CaseInput) -> AppResult<DisciplineCase> {
        caller.require(Capability::AdministrativeAccess)?;
        check_penalty(Some(input.penalty_points))?;
        check_evidence(Some(&input.evidence))?;
        if input.offence_description.trim().is_empty() {
            return Err(AppError::validation(
                "offence_description",
                "This field may not be blank.",
            ));
        }

        let (farmer, chair_id) = self
            .farmers
            .find_with_block_chair(input.farmer_id)
            .await?
            .ok_or_else(|| AppError::validation("farmer", "Invalid farmer ID."))?;
        caller.chair_scope().ensure_chaired(chair_id, "farmer")?;

        if input.status == CaseStatus::Resolved {
            caller.require(Capability::ResolveCases)?;
            require_action(&input.action_taken)?;
        }

        let row = new_case(input, &farmer, caller, Timestamp::now());
        let case = self.cases.create(row).await?;
        tracing::info!(
            case_id = case.id,
            farmer_id = case.farmer_id,
            offence = %case.offence_type,
            reported_by = caller.user_id,
            "Discipline case opened"
        );
        Ok(case)
    }

    /// Cases on blocks the caller does not chair are refused, not hidden.
    pub async fn get(&self, caller: &Caller, case_id: i32) -> AppResult<DisciplineCase> {
        caller.require(Capability::AdministrativeAccess)?;
        let case = self.find(case_id).await?;
        self.ensure_reachable(caller, &case).await?;
        Ok(case)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        case_id: i32,
        patch: CasePatch,
    ) -> AppResult<DisciplineCase> {
        caller.require(Capability::AdministrativeAccess)?;
        let case = self.find(case_id).await?;
        self.ensure_reachable(caller, &case).await?;
        check_penalty(patch.penalty_points)?;
        check_evidence(patch.evidence.as_ref())?;
        if patch.status == Some(CaseStatus::Resolved) && case.status != CaseStatus::Resolved {
            caller.require(Capability::ResolveCases)?;
        }

        let actor = caller.user_id;
        let updated = self
            .cases
            .modify(case_id, move |current| {
                plan_update(current, patch, actor, Timestamp::now())
            })
            .await?;
        tracing::info!(case_id, status = %updated.status, actor, "Discipline case updated");
        Ok(updated)
    }

    pub async fn delete(&self, caller: &Caller, case_id: i32) -> AppResult<()> {
        caller.require(Capability::AdministrativeAccess)?;
        let case = self.find(case_id).await?;
        self.ensure_reachable(caller, &case).await?;

        self.cases.delete(case_id).await?;
        tracing::info!(case_id, actor = caller.user_id, "Discipline case deleted");
        Ok(())
    }

    /// Resolves a case with the action taken, stamping the resolver.
    pub async fn resolve(
        &self,
        caller: &Caller,
        case_id: i32,
        action_taken: Option<String>,
    ) -> AppResult<DisciplineCase> {
        caller.require(Capability::ResolveCases)?;
        let action_taken = action_taken.unwrap_or_default();
        require_action(&action_taken)?;

        let case = self.find(case_id).await?;
        self.ensure_reachable(caller, &case).await?;

        let actor = caller.user_id;
        let resolved = self
            .cases
            .modify(case_id, move |current| {
                let patch = CasePatch {
                    status: Some(CaseStatus::Resolved),
                    action_taken: Some(action_taken),
                    ..Default::default()
                };
                let mut changes = plan_update(current, patch, actor, Timestamp::now())?;
                changes.resolved_by = Some(Some(actor));
                Ok(changes)
            })
            .await?;
        tracing::info!(case_id, actor, "Discipline case resolved");
        Ok(resolved)
    }

    pub async fn list(
        &self,
        caller: &Caller,
        filter: &CaseFilter,
        sort: Sort<CaseSortKey>,
    ) -> AppResult<Vec<DisciplineCase>> {
        caller.require(Capability::AdministrativeAccess)?;
        self.cases.list(filter, caller.chair_scope(), sort).await
    }

    pub async fn stats(&self, caller: &Caller) -> AppResult<CaseStats> {
        caller.require(Capability::AdministrativeAccess)?;
        let rows = self
            .cases
            .count_by_status_and_severity(caller.chair_scope())
            .await?;
        Ok(CaseStats::tally(&rows))
    }

    async fn find(&self, case_id: i32) -> AppResult<DisciplineCase> {
        self.cases
            .find_by_id(case_id)
            .await?
            .ok_or_else(|| AppError::not_found("discipline case", case_id))
    }

    async fn ensure_reachable(&self, caller: &Caller, case: &DisciplineCase) -> AppResult<()> {
        let scope = caller.chair_scope();
        if scope == RecordScope::All {
            return Ok(());
        }
        let chair_id = match case.block_id {
            Some(block_id) => self.orgs.find_block_chair(block_id).await?,
            None => None,
        };
        if scope.contains_chaired(chair_id) {
            Ok(())
        } else {
            tracing::warn!(user_id = caller.user_id, case_id = case.id, "Case outside chaired block");
            Err(AppError::forbidden(OTHER_BLOCK_CASE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FarmerRole, Gender, Role};
    use crate::schema::discipline_cases;
    use bigdecimal::BigDecimal;
    use diesel::pg::Pg;
    use diesel::prelude::*;

    fn case(status: CaseStatus, action_taken: &str) -> DisciplineCase {
        DisciplineCase {
            id: 1,
            farmer_id: 2,
            block_id: Some(3),
            section_id: Some(4),
            date_reported: Timestamp::UNIX_EPOCH.into(),
            date_incident: None,
            offence_type: OffenceType::Absence,
            offence_description: "Missed canal cleaning".to_string(),
            action_taken: action_taken.to_string(),
            status,
            severity: Severity::Moderate,
            penalty_points: 2,
            comment: String::new(),
            reported_by: Some(9),
            resolved_by: None,
            resolution_date: None,
            evidence: JsonValue::Array(vec![]),
        }
    }

    fn resolve_patch(action: Option<&str>) -> CasePatch {
        CasePatch {
            status: Some(CaseStatus::Resolved),
            action_taken: action.map(str::to_string),
            ..Default::default()
        }
    }

    fn farmer(block_id: i32, section_id: i32) -> Farmer {
        Farmer {
            id: 2,
            first_name: "Chikondi".to_string(),
            last_name: "Mwale".to_string(),
            middle_name: None,
            gender: Gender::Male,
            phone_number: "+265999000002".to_string(),
            email: None,
            registration_number: "LRS00002".to_string(),
            number_of_plots: 2,
            amount_per_plot: BigDecimal::from(15000),
            total_amount: BigDecimal::from(30000),
            location_id: 1,
            block_id,
            section_id,
            role: FarmerRole::Farmer,
            next_of_kin: None,
            is_active: true,
            date_registered: Timestamp::UNIX_EPOCH.into(),
        }
    }

    fn input(status: CaseStatus) -> CaseInput {
        CaseInput {
            farmer_id: 2,
            date_incident: None,
            offence_type: OffenceType::Absence,
            offence_description: "Missed canal cleaning".to_string(),
            action_taken: "Fined".to_string(),
            status,
            severity: Severity::Moderate,
            penalty_points: 1,
            comment: String::new(),
            evidence: JsonValue::Array(vec![]),
        }
    }

    fn secretary() -> Caller {
        Caller {
            user_id: 9,
            username: "secretary".to_string(),
            role: Role::Secretary,
            block_id: None,
            section_id: None,
        }
    }

    #[test]
    fn test_new_case_copies_farmer_placement() {
        let now: Timestamp = "2025-05-01T08:00:00Z".parse().unwrap();
        let row = new_case(input(CaseStatus::Open), &farmer(3, 7), &secretary(), now);

        assert_eq!(row.farmer_id, 2);
        assert_eq!(row.block_id, Some(3));
        assert_eq!(row.section_id, Some(7));
        assert_eq!(row.reported_by, Some(9));
        assert!(row.resolved_by.is_none() && row.resolution_date.is_none());
    }

    #[test]
    fn test_case_opened_resolved_is_stamped() {
        let now: Timestamp = "2025-05-01T08:00:00Z".parse().unwrap();
        let row = new_case(input(CaseStatus::Resolved), &farmer(3, 7), &secretary(), now);

        assert_eq!(row.resolved_by, Some(9));
        assert_eq!(row.resolution_date.map(|ts| ts.to_jiff()), Some(now));
    }

    #[test]
    fn test_updates_never_write_placement() {
        let patch = CasePatch {
            status: Some(CaseStatus::Resolved),
            action_taken: Some("Fined".to_string()),
            comment: Some("Moved section since".to_string()),
            ..Default::default()
        };
        let changes = plan_update(&case(CaseStatus::Open, ""), patch, 5, Timestamp::now()).unwrap();

        let sql = diesel::debug_query::<Pg, _>(
            &diesel::update(discipline_cases::table.filter(discipline_cases::id.eq(1)))
                .set(&changes),
        )
        .to_string();
        assert!(sql.contains("\"status\""));
        assert!(!sql.contains("\"block_id\""));
        assert!(!sql.contains("\"section_id\""));
        assert!(!sql.contains("\"farmer_id\""));
    }

    #[test]
    fn test_resolving_without_action_is_rejected() {
        let current = case(CaseStatus::Investigating, "");
        match plan_update(&current, resolve_patch(None), 5, Timestamp::now()) {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "action_taken");
                assert_eq!(reason, ACTION_REQUIRED);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(plan_update(&current, resolve_patch(Some("   ")), 5, Timestamp::now()).is_err());
    }

    #[test]
    fn test_stored_action_satisfies_resolution() {
        let current = case(CaseStatus::HearingScheduled, "Warning issued");
        assert!(plan_update(&current, resolve_patch(None), 5, Timestamp::now()).is_ok());
    }

    #[test]
    fn test_first_resolution_stamps_resolver_and_date() {
        let now: Timestamp = "2025-05-01T08:00:00Z".parse().unwrap();
        let changes =
            plan_update(&case(CaseStatus::Open, ""), resolve_patch(Some("Fined")), 5, now).unwrap();

        assert_eq!(changes.resolved_by, Some(Some(5)));
        let stamped = changes.resolution_date.flatten().map(|ts| ts.to_jiff());
        assert_eq!(stamped, Some(now));
    }

    #[test]
    fn test_resolution_date_is_never_overwritten() {
        let mut current = case(CaseStatus::Resolved, "Fined");
        current.resolved_by = Some(5);
        current.resolution_date = Some(Timestamp::UNIX_EPOCH.into());

        let patch = CasePatch {
            comment: Some("Paid in full".to_string()),
            ..Default::default()
        };
        let changes = plan_update(&current, patch, 6, Timestamp::now()).unwrap();
        assert!(changes.resolution_date.is_none());
        assert!(changes.resolved_by.is_none());
    }

    #[test]
    fn test_transitions() {
        use CaseStatus::*;

        assert!(transition_allowed(Open, Investigating));
        assert!(transition_allowed(Open, Resolved));
        assert!(transition_allowed(HearingScheduled, Resolved));
        assert!(transition_allowed(Resolved, Closed));
        assert!(transition_allowed(Resolved, Appealed));
        assert!(transition_allowed(Closed, Appealed));
        assert!(transition_allowed(Appealed, HearingScheduled));
        assert!(transition_allowed(Closed, Closed));

        assert!(!transition_allowed(Investigating, Open));
        assert!(!transition_allowed(Open, Closed));
        assert!(!transition_allowed(Open, Appealed));
        assert!(!transition_allowed(Closed, Open));
        assert!(!transition_allowed(Resolved, Investigating));
    }

    #[test]
    fn test_illegal_transition_is_validation_error() {
        let patch = CasePatch {
            status: Some(CaseStatus::Open),
            ..Default::default()
        };
        assert!(matches!(
            plan_update(&case(CaseStatus::Closed, "x"), patch, 1, Timestamp::now()),
            Err(AppError::Validation { field, .. }) if field == "status"
        ));
    }

    #[test]
    fn test_stats_tally() {
        let stats = CaseStats::tally(&[
            (CaseStatus::Open, Severity::Serious, 2),
            (CaseStatus::Open, Severity::Minor, 3),
            (CaseStatus::Resolved, Severity::Critical, 1),
            (CaseStatus::Closed, Severity::Serious, 4),
        ]);
        assert_eq!(
            stats,
            CaseStats {
                total_cases: 10,
                open_cases: 5,
                resolved_cases: 1,
                serious_cases: 6,
            }
        );
    }

    #[test]
    fn test_evidence_must_be_a_list() {
        assert!(check_evidence(Some(&serde_json::json!(["photo.jpg"]))).is_ok());
        assert!(check_evidence(Some(&serde_json::json!({"a": 1}))).is_err());
        assert!(check_evidence(None).is_ok());
    }
}
