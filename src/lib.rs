//! scheme-rs
//!
//! Backend for an irrigation scheme: the location/block/section hierarchy,
//! user accounts with role-scoped access, the farmer registry, attendance,
//! discipline cases, the payment ledger and dashboard reporting.

use shadow_rs::shadow;
shadow!(build);

pub mod access;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
