//! Layered configuration.
//!
//! Sources, lowest to highest priority:
//! 1. `default.toml`
//! 2. `{environment}.toml`, with the environment taken from `SCHEME_APP_ENV`
//! 3. `local.toml` (not committed)
//! 4. `SCHEME_*` environment variables, `__` separating nested keys

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{ApplicationConfig, DatabaseConfig, JwtConfig, ServerConfig, Settings};
