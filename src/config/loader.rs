//! Layered settings loader.
//!
//! Sources, lowest precedence first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml`
//! 3. `local.toml`
//! 4. `SCHEME_*` variables, `__` separating nested keys
//!    (`SCHEME_DATABASE__URL` sets `database.url`)
//!
//! `SCHEME_CONFIG_FILE` (or `--config`) replaces steps 1-3 with a single file.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "SCHEME_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "SCHEME_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "SCHEME";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, the only file read.
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Resolves the sources from `SCHEME_CONFIG_DIR`, `SCHEME_CONFIG_FILE`
    /// and `SCHEME_APP_ENV`. The first two are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set; use the first for layered files \
                 or the second for a single file.",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Applies `--config` and `--env` from the command line on top of the
    /// environment-derived sources.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        environment: Option<AppEnvironment>,
    ) -> Self {
        if config_file.is_some() {
            self.config_file = config_file;
        }
        if let Some(environment) = environment {
            self.environment = environment;
        }
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Reads every source, deserializes and validates the result.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.config_file {
            Some(file) => Self::add_file_source(Config::builder(), file, true)?,
            None => self.add_layered_files(Config::builder())?,
        };

        Self::add_env_source(builder).build().map_err(ConfigError::from)
    }

    fn add_layered_files(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder = Self::add_file_source(builder, &self.config_dir.join("default.toml"), true)?;
        let env_file = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_file, false)?;
        Self::add_file_source(builder, &self.config_dir.join("local.toml"), false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(&path.to_string_lossy(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touching process environment run one at a time.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const BASE: &str = r#"
[application]
name = "scheme-test"
timezone = "Africa/Blantyre"

[server]
port = 8000

[database]
url = "postgres://localhost/scheme_test"

[jwt]
secret = "0123456789abcdef0123456789abcdef"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Sets or removes variables and restores them on drop.
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            for key in [CONFIG_DIR_ENV, CONFIG_FILE_ENV, AppEnvironment::ENV_VAR] {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore.push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore.push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_loader_new_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment, AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(CONFIG_FILE_ENV, "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("SCHEME_CONFIG_DIR"));
                assert!(msg.contains("SCHEME_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        match ConfigLoader::new().unwrap().load() {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_default_toml_only() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("default.toml", BASE)]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load");
        assert_eq!(settings.application.name, "scheme-test");
        assert_eq!(settings.application.timezone, "Africa/Blantyre");
        assert_eq!(settings.jwt.access_token_expiration_minutes, 30);
    }

    #[test]
    fn test_full_precedence_chain() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[
            ("default.toml", BASE),
            ("production.toml", "[server]\nport = 9000\nhost = \"0.0.0.0\"\n"),
            ("local.toml", "[server]\nport = 9100\n"),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set(AppEnvironment::ENV_VAR, "production");
        env.set("SCHEME_DATABASE__MAX_CONNECTIONS", "25");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load");
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.database.max_connections, 25);
    }

    #[test]
    fn test_single_file_mode() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("scheme.toml", BASE)]);
        let file = temp_dir.path().join("scheme.toml");
        env.set(CONFIG_FILE_ENV, file.to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load");
        assert_eq!(settings.database.url, "postgres://localhost/scheme_test");
    }

    #[test]
    fn test_command_line_overrides_win() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let layered = setup_config_dir(&[
            ("default.toml", BASE),
            ("staging.toml", "[server]\nport = 9200\n"),
        ]);
        env.set(CONFIG_DIR_ENV, layered.path().to_str().unwrap());

        let loader = ConfigLoader::new()
            .unwrap()
            .with_overrides(None, Some(AppEnvironment::Staging));
        assert_eq!(loader.environment(), AppEnvironment::Staging);
        assert_eq!(loader.load().unwrap().server.port, 9200);

        let single = setup_config_dir(&[("only.toml", BASE)]);
        let loader = ConfigLoader::new()
            .unwrap()
            .with_overrides(Some(single.path().join("only.toml")), None);
        assert_eq!(loader.load().unwrap().server.port, 8000);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("default.toml", "[jwt]\nsecret = \"short\"\n")]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        assert!(matches!(
            ConfigLoader::new().unwrap().load(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
