//! Repository layer for data access operations.
//!
//! Repositories own their transactions; services above them never see a
//! connection.

mod attendance_repo;
mod discipline_repo;
mod farmer_repo;
mod org_repo;
mod payment_repo;
mod sort;
mod user_repo;

pub use attendance_repo::{AttendanceFilter, AttendanceRepository};
pub use discipline_repo::{CaseFilter, DisciplineRepository};
pub use farmer_repo::{CHAIRPERSON_TAKEN, FarmerFilter, FarmerRepository, PlotsRow};
pub use org_repo::{BLOCK_ALREADY_CHAIRED, OrgRepository, ensure_chair_vacant};
pub use payment_repo::{LedgerTally, PaidWindow, PaymentFilter, PaymentRepository, VerifyOutcome};
pub use sort::{CaseSortKey, PaymentSortKey, Sort};
pub use user_repo::UserRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub orgs: OrgRepository,
    pub users: UserRepository,
    pub farmers: FarmerRepository,
    pub attendance: AttendanceRepository,
    pub discipline: DisciplineRepository,
    pub payments: PaymentRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            orgs: OrgRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            farmers: FarmerRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            discipline: DisciplineRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool),
        }
    }
}
