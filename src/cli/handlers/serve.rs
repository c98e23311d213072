//! `scheme-rs serve`: start the API, or validate settings with `--dry-run`.

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config.clone())
            .run()
            .await
            .map_err(|source| AppError::Internal { source })
    }

    /// Checks every settings section and prints where the server would listen.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Timezone for date windows: {}",
            self.config.application.timezone
        );
        println!(
            "✓ Migrations on startup: {}",
            if self.config.database.auto_migrate { "enabled" } else { "disabled" }
        );
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/scheme_test".to_string();
        config.jwt.secret = "s".repeat(40);
        config
    }

    #[test]
    fn test_new_keeps_settings() {
        let config = valid_settings();
        let handler = ServeCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_dry_run_with_valid_settings() {
        let handler = ServeCommandHandler::new(valid_settings());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_rejects_port_zero() {
        let mut config = valid_settings();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);

        match handler.execute(true).await {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "server.port"),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_rejects_short_secret() {
        let mut config = valid_settings();
        config.jwt.secret = "short".to_string();
        let handler = ServeCommandHandler::new(config);

        let result = handler.execute(true).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
