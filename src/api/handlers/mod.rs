//! HTTP request handlers, one module per resource.

pub mod accounts;
pub mod attendance;
pub mod discipline;
pub mod farmers;
pub mod health;
pub mod org;
pub mod payments;
