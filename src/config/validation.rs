//! Range and format checks applied after loading.

use crate::config::error::ConfigError;
use crate::config::settings::{DatabaseConfig, JwtConfig, ServerConfig, Settings};

const MIN_SECRET_LEN: usize = 32;

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required.",
            ));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::validation(
                "database.url",
                "Expected a PostgreSQL URL: postgres://[user:password@]host[:port]/database",
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ValidationError {
                field: "jwt.secret".to_string(),
                message: format!("JWT secret must be at least {} characters.", MIN_SECRET_LEN),
            });
        }
        if self.access_token_expiration_minutes <= 0 {
            return Err(ConfigError::validation(
                "jwt.access_token_expiration_minutes",
                "Access token expiration must be positive.",
            ));
        }
        if self.refresh_token_expiration_hours <= 0 {
            return Err(ConfigError::validation(
                "jwt.refresh_token_expiration_hours",
                "Refresh token expiration must be positive.",
            ));
        }
        if self.access_lifetime() >= self.refresh_lifetime() {
            return Err(ConfigError::validation(
                "jwt",
                "Refresh tokens must outlive access tokens.",
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.logger
            .validate()
            .map_err(|e| ConfigError::validation("logger", e.to_string()))?;
        Ok(())
    }
}
