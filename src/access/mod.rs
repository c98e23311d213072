//! Role capabilities and record scoping.
//!
//! Every role maps to a fixed set of [`Capability`] values, and a [`Caller`]
//! resolves to a [`RecordScope`] that services apply as a query filter.

mod caller;
mod capability;

pub use caller::{CHAIR_UNASSIGNED, Caller, PERMISSION_DENIED, RecordScope};
pub use capability::Capability;
