use crate::access::Capability;
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};

pub const CHAIR_UNASSIGNED: &str = "Block Chair has no block or section assigned.";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// The authenticated identity a request acts as, resolved once by the auth
/// middleware and passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub block_id: Option<i32>,
    pub section_id: Option<i32>,
}

/// How far a caller's reads and writes reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    /// No narrowing.
    All,
    /// Records whose block and section both equal these.
    BlockSection { block_id: i32, section_id: i32 },
    /// Records whose block designates this user as its chair.
    ChairedBy(i32),
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            block_id: user.block_id,
            section_id: user.section_id,
        }
    }
}

impl Caller {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.grants(capability)
    }

    /// Fails with `Forbidden` unless the caller's role grants `capability`.
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.can(capability) {
            return Ok(());
        }
        tracing::warn!(
            user_id = self.user_id,
            role = %self.role,
            capability = capability.describe(),
            "Permission denied"
        );
        Err(AppError::forbidden(PERMISSION_DENIED))
    }

    /// The chair's exact block and section, or a client error if either is unset.
    pub fn chair_assignment(&self) -> AppResult<(i32, i32)> {
        match (self.block_id, self.section_id) {
            (Some(block_id), Some(section_id)) => Ok((block_id, section_id)),
            _ => Err(AppError::bad_request(CHAIR_UNASSIGNED)),
        }
    }

    /// Scope for records placed by block and section (farmers, attendance).
    pub fn placement_scope(&self) -> AppResult<RecordScope> {
        if !self.role.is_scoped() {
            return Ok(RecordScope::All);
        }
        let (block_id, section_id) = self.chair_assignment()?;
        Ok(RecordScope::BlockSection {
            block_id,
            section_id,
        })
    }

    /// Scope for records reached through the block's designated chair
    /// (discipline cases, payments).
    pub fn chair_scope(&self) -> RecordScope {
        if self.role.is_scoped() {
            RecordScope::ChairedBy(self.user_id)
        } else {
            RecordScope::All
        }
    }

    /// Checks a block chair's attendance submission against their own assignment.
    pub fn check_attendance_placement(
        &self,
        block_id: Option<i32>,
        section_id: Option<i32>,
    ) -> AppResult<()> {
        if !self.role.is_scoped() {
            return Ok(());
        }
        let (own_block, own_section) = self
            .chair_assignment()
            .map_err(|_| AppError::bad_request("Block Chair must be assigned a block and section."))?;
        if block_id != Some(own_block) || section_id != Some(own_section) {
            tracing::warn!(
                user = %self.username,
                ?block_id,
                ?section_id,
                "Attendance submitted outside assigned block/section"
            );
            return Err(AppError::forbidden(
                "Block Chairs can only record attendance for their assigned block and section.",
            ));
        }
        Ok(())
    }
}

impl RecordScope {
    /// Whether a record placed at `(block_id, section_id)` is inside the scope.
    pub fn contains_placement(&self, block_id: Option<i32>, section_id: Option<i32>) -> bool {
        match self {
            RecordScope::All => true,
            RecordScope::BlockSection {
                block_id: own_block,
                section_id: own_section,
            } => block_id == Some(*own_block) && section_id == Some(*own_section),
            RecordScope::ChairedBy(_) => false,
        }
    }

    /// Whether a record under a block whose designated chair is `block_chair_id`
    /// is inside the scope.
    pub fn contains_chaired(&self, block_chair_id: Option<i32>) -> bool {
        match self {
            RecordScope::All => true,
            RecordScope::ChairedBy(user_id) => block_chair_id == Some(*user_id),
            RecordScope::BlockSection { .. } => false,
        }
    }

    /// `Forbidden` when a chaired record falls outside the scope.
    pub fn ensure_chaired(&self, block_chair_id: Option<i32>, entity: &str) -> AppResult<()> {
        if self.contains_chaired(block_chair_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "You can only access {} records from the block you chair.",
                entity
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role, block_id: Option<i32>, section_id: Option<i32>) -> Caller {
        Caller {
            user_id: 10,
            username: "chair".to_string(),
            role,
            block_id,
            section_id,
        }
    }

    #[test]
    fn test_require_reports_forbidden() {
        let farmer = caller(Role::Farmer, None, None);
        match farmer.require(Capability::AdministrativeAccess) {
            Err(AppError::Forbidden { message }) => assert_eq!(message, PERMISSION_DENIED),
            other => panic!("Expected Forbidden, got {:?}", other),
        }
        assert!(caller(Role::Treasurer, None, None).require(Capability::VerifyPayments).is_ok());
    }

    #[test]
    fn test_unrestricted_roles_get_full_scope() {
        for role in [Role::Admin, Role::President, Role::Treasurer, Role::Secretary] {
            let c = caller(role, None, None);
            assert_eq!(c.placement_scope().unwrap(), RecordScope::All);
            assert_eq!(c.chair_scope(), RecordScope::All);
        }
    }

    #[test]
    fn test_chair_without_section_is_client_error() {
        let c = caller(Role::BlockChair, Some(1), None);
        match c.placement_scope() {
            Err(AppError::BadRequest { message }) => assert_eq!(message, CHAIR_UNASSIGNED),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_chair_scope_matches_block_and_section_exactly() {
        let scope = caller(Role::BlockChair, Some(1), Some(2)).placement_scope().unwrap();
        assert!(scope.contains_placement(Some(1), Some(2)));
        assert!(!scope.contains_placement(Some(1), Some(3)));
        assert!(!scope.contains_placement(Some(1), None));
        assert!(!scope.contains_placement(None, Some(2)));
    }

    #[test]
    fn test_chair_posting_other_section_is_forbidden() {
        let c = caller(Role::BlockChair, Some(4), Some(8));
        assert!(c.check_attendance_placement(Some(4), Some(8)).is_ok());
        assert!(matches!(
            c.check_attendance_placement(Some(4), Some(9)),
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            c.check_attendance_placement(None, None),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_unassigned_chair_posting_is_bad_request() {
        let c = caller(Role::BlockChair, None, None);
        assert!(matches!(
            c.check_attendance_placement(Some(1), Some(1)),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_admin_posting_anywhere_is_allowed() {
        let c = caller(Role::Admin, None, None);
        assert!(c.check_attendance_placement(None, None).is_ok());
        assert!(c.check_attendance_placement(Some(3), Some(5)).is_ok());
    }

    #[test]
    fn test_chaired_scope() {
        let scope = caller(Role::BlockChair, Some(1), Some(1)).chair_scope();
        assert!(scope.contains_chaired(Some(10)));
        assert!(!scope.contains_chaired(Some(11)));
        assert!(!scope.contains_chaired(None));
        assert!(matches!(
            scope.ensure_chaired(Some(11), "payment"),
            Err(AppError::Forbidden { .. })
        ));
        assert!(RecordScope::All.contains_chaired(None));
    }
}
