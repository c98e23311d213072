//! Request and response bodies, one module per resource.
//!
//! Requests convert into service inputs with `From`; responses are built from
//! models or service views the same way. Foreign keys are exposed under the
//! bare resource name (`block`, `section`, `farmer`).

mod attendance;
mod auth;
mod discipline;
mod error;
mod farmer;
mod health;
mod org;
mod pagination;
mod payment;
mod stats;
mod user;

pub use attendance::{
    AttendanceListQuery, AttendanceResponse, AttendanceStatsQuery, AttendanceStatsResponse,
    BlockAttendanceQuery, CreateAttendanceRequest, PenaltyResetResponse,
};
pub use auth::{
    LoginRequest, LoginResponse, REGISTRATION_PENDING, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, RegisterResponse, SessionUser,
};
pub use discipline::{
    CaseListQuery, CaseResponse, CaseStatsResponse, CreateCaseRequest, ResolveCaseRequest,
    UpdateCaseRequest,
};
pub use error::ErrorResponse;
pub use farmer::{
    CreateFarmerRequest, FarmerListQuery, FarmerResponse, FarmerSummary, UpdateFarmerRequest,
};
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use org::{
    BlockResponse, CreateBlockRequest, CreateLocationRequest, CreateSectionRequest,
    LocationResponse, SectionListQuery, SectionResponse,
};
pub use pagination::{PagedResponse, PaginationMeta, PaginationParams};
pub use payment::{
    CreatePaymentRequest, PaymentListQuery, PaymentResponse, PaymentStatsResponse,
    TypeTotalsResponse, UpdatePaymentRequest, VerificationStats, WindowTotalsResponse,
};
pub use stats::{DashboardResponse, PlotsSummaryRow, UnpaidFarmerResponse};
pub use user::{SectionOption, SectionsOfBlockQuery, UpdateUserRequest, UserResponse};
