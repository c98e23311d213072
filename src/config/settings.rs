//! Configuration structures loaded from TOML files and `SCHEME_*` variables.

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::logger::LoggerConfig;

fn default_app_name() -> String {
    "scheme-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_access_minutes() -> i64 {
    30
}

fn default_refresh_hours() -> i64 {
    168
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,

    /// IANA zone used for "today" in attendance and payment statistics.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
            timezone: default_timezone(),
        }
    }
}

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Origins allowed by CORS; empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations when the server starts.
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

/// JWT authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret. Supply it through `SCHEME_JWT__SECRET` outside development.
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_access_minutes")]
    pub access_token_expiration_minutes: i64,

    #[serde(default = "default_refresh_hours")]
    pub refresh_token_expiration_hours: i64,
}

impl JwtConfig {
    pub fn access_lifetime(&self) -> SignedDuration {
        SignedDuration::from_mins(self.access_token_expiration_minutes)
    }

    pub fn refresh_lifetime(&self) -> SignedDuration {
        SignedDuration::from_hours(self.refresh_token_expiration_hours)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_expiration_minutes: default_access_minutes(),
            refresh_token_expiration_hours: default_refresh_hours(),
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logger: LoggerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_server_config() -> impl Strategy<Value = ServerConfig> {
        (
            prop_oneof![Just("127.0.0.1".to_string()), Just("0.0.0.0".to_string())],
            1u16..=65535,
            1u64..300,
            proptest::collection::vec("https?://[a-z]{1,10}\\.[a-z]{2,3}", 0..3),
        )
            .prop_map(|(host, port, request_timeout, cors_origins)| ServerConfig {
                host,
                port,
                request_timeout,
                cors_origins,
            })
    }

    fn arb_jwt_config() -> impl Strategy<Value = JwtConfig> {
        ("[a-zA-Z0-9]{32,48}", 1i64..120, 121i64..1000).prop_map(|(secret, minutes, hours)| JwtConfig {
            secret,
            access_token_expiration_minutes: minutes,
            refresh_token_expiration_hours: hours,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_settings_survive_toml(server in arb_server_config(), jwt in arb_jwt_config()) {
            let settings = Settings { server, jwt, ..Default::default() };

            let toml_str = toml::to_string(&settings).expect("Settings should serialize to TOML");
            let back: Settings = toml::from_str(&toml_str).expect("TOML should deserialize");

            prop_assert_eq!(settings, back);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.application.name, "scheme-rs");
        assert_eq!(settings.application.timezone, "UTC");
        assert_eq!(settings.server.address(), "127.0.0.1:8000");
        assert_eq!(settings.jwt.access_token_expiration_minutes, 30);
        assert_eq!(settings.jwt.refresh_token_expiration_hours, 168);
        assert!(!settings.database.auto_migrate);
    }

    #[test]
    fn test_token_lifetimes() {
        let jwt = JwtConfig::default();
        assert_eq!(jwt.access_lifetime().as_secs(), 30 * 60);
        assert_eq!(jwt.refresh_lifetime().as_secs(), 168 * 3600);
    }

    #[test]
    fn test_empty_table_uses_defaults() {
        let settings: Settings = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logger.level, "info");
    }
}
