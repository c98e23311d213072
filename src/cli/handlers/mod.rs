//! One handler per subcommand; parsing and settings merging happen before these run.

pub mod migrate;
pub mod serve;

pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
