mod attendance;
mod discipline;
mod enums;
mod farmer;
mod org;
mod payment;
mod user;

pub use attendance::{Attendance, NewAttendance};
pub use discipline::{DisciplineCase, DisciplineCaseChangeset, NewDisciplineCase};
pub use enums::{
    AttendanceStatus, AttendanceType, CaseStatus, FarmerRole, Gender, OffenceType, PaymentMethod,
    PaymentType, Role, Severity,
};
pub use farmer::{
    Farmer, FarmerChangeset, NewFarmer, REGISTRATION_PREFIX, compute_total,
    format_registration_number, next_registration_sequence,
};
pub use org::{Block, Location, NewBlock, NewLocation, NewSection, Section};
pub use payment::{NewPayment, Payment, PaymentChangeset};
pub use user::{NewUser, UpdateUser, User};
