//! Business rules.
//!
//! Every operation takes the [`Caller`](crate::access::Caller) it acts for,
//! checks the caller's capability and scope, validates the input and only then
//! reaches the repositories.

mod account_service;
mod attendance_service;
mod discipline_service;
mod farmer_service;
mod org_service;
mod payment_service;
mod report_service;

pub use account_service::{
    AccountService, CHAIR_NEEDS_PLACEMENT, INVALID_CREDENTIALS, Registration, Session, UserPatch,
};
pub use attendance_service::{AttendanceInput, AttendanceService, AttendanceStats};
pub use discipline_service::{
    CaseInput, CasePatch, CaseStats, DEFAULT_CASE_SORT, DisciplineService, transition_allowed,
};
pub use farmer_service::{FarmerInput, FarmerPatch, FarmerService, FarmerView};
pub use org_service::{OrgNames, OrgService, SectionView};
pub use payment_service::{
    DEFAULT_PAYMENT_SORT, PaymentInput, PaymentPatch, PaymentService, PaymentStats, PaymentView,
    TypeTotals, WindowTotals,
};
pub use report_service::{DashboardStats, ReportService, UnpaidFarmer};

use crate::config::JwtConfig;
use crate::repositories::Repositories;
use crate::utils::Clock;

/// All services, shared through the axum state. Cloning is cheap; the
/// repositories only hold the pool.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub orgs: OrgService,
    pub farmers: FarmerService,
    pub attendance: AttendanceService,
    pub discipline: DisciplineService,
    pub payments: PaymentService,
    pub reports: ReportService,
}

impl Services {
    pub fn new(repos: Repositories, jwt: JwtConfig, clock: Clock) -> Self {
        Self {
            accounts: AccountService::new(repos.users.clone(), repos.orgs.clone(), jwt),
            orgs: OrgService::new(repos.orgs.clone()),
            farmers: FarmerService::new(repos.farmers.clone(), repos.orgs.clone()),
            attendance: AttendanceService::new(
                repos.attendance.clone(),
                repos.farmers.clone(),
                clock.clone(),
            ),
            discipline: DisciplineService::new(
                repos.discipline,
                repos.farmers.clone(),
                repos.orgs,
            ),
            payments: PaymentService::new(repos.payments.clone(), repos.farmers.clone(), clock),
            reports: ReportService::new(repos.farmers, repos.attendance, repos.payments),
        }
    }
}
