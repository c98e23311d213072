use crate::models::Role;

/// An action guarded by role.
///
/// `RecordAttendance` and `ListAttendance` are granted to block chairs, who are
/// then further narrowed to their own block and section by [`super::RecordScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AdministrativeAccess,
    ManageFarmers,
    ManageOrgData,
    AssignRoles,
    ManageUsers,
    RecordAttendance,
    ListAttendance,
    ResetPenalties,
    ResolveCases,
    VerifyPayments,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::AdministrativeAccess,
        Capability::ManageFarmers,
        Capability::ManageOrgData,
        Capability::AssignRoles,
        Capability::ManageUsers,
        Capability::RecordAttendance,
        Capability::ListAttendance,
        Capability::ResetPenalties,
        Capability::ResolveCases,
        Capability::VerifyPayments,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            Capability::AdministrativeAccess => "access administrative endpoints",
            Capability::ManageFarmers => "manage farmers",
            Capability::ManageOrgData => "manage locations, blocks and sections",
            Capability::AssignRoles => "change roles or approval status",
            Capability::ManageUsers => "manage user accounts",
            Capability::RecordAttendance => "record attendance",
            Capability::ListAttendance => "view attendance records",
            Capability::ResetPenalties => "reset penalty points",
            Capability::ResolveCases => "resolve discipline cases",
            Capability::VerifyPayments => "verify payments",
        }
    }
}

impl Role {
    pub fn grants(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Farmer => false,
            Role::Admin => true,
            Role::BlockChair => matches!(capability, AdministrativeAccess | RecordAttendance | ListAttendance),
            Role::President => matches!(capability, AdministrativeAccess | RecordAttendance | ResolveCases),
            Role::Treasurer => matches!(capability, AdministrativeAccess | RecordAttendance | VerifyPayments),
            Role::Secretary => matches!(
                capability,
                AdministrativeAccess | ManageFarmers | ManageOrgData | RecordAttendance | ResolveCases
            ),
        }
    }

    /// Roles whose reads are narrowed to their own block.
    pub fn is_scoped(&self) -> bool {
        matches!(self, Role::BlockChair)
    }
}
