//! Dispatches a parsed command to its handler.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::AppResult;

/// Large rollbacks are allowed but called out before they run.
const LARGE_ROLLBACK: u32 = 20;

/// Runs the command in `cli` with already merged `settings`. No command means `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            if let Some(steps) = rollback
                && *steps > LARGE_ROLLBACK
            {
                eprintln!(
                    "Warning: rolling back {} migrations; consider smaller steps.",
                    steps
                );
            }
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use clap::Parser;

    fn valid_settings() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/scheme_test".to_string();
        config.jwt.secret = "k".repeat(32);
        config
    }

    #[tokio::test]
    async fn test_serve_dry_run_dispatches_to_validation() {
        let cli = Cli::try_parse_from(["scheme-rs", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, valid_settings()).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_dry_run_surfaces_invalid_settings() {
        let cli = Cli::try_parse_from(["scheme-rs", "serve", "--dry-run"]).unwrap();
        let mut settings = valid_settings();
        settings.database.url = String::new();

        let result = execute_command(&cli, settings).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_migrate_with_invalid_database_url_fails_before_connecting() {
        let cli = Cli::try_parse_from(["scheme-rs", "migrate", "--dry-run"]).unwrap();
        let mut settings = valid_settings();
        settings.database.url = "mysql://localhost/scheme".to_string();

        let result = execute_command(&cli, settings).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
