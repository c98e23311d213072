//! Folds command-line flags into the loaded settings.
//!
//! Precedence, lowest first: config files, `SCHEME_*` variables, global flags
//! (`--verbose`/`--quiet`), then `serve` flags.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads settings from the sources selected by `--config` and `--env`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = ConfigLoader::new()?
            .with_overrides(cli.config.clone(), cli.env.map(Into::into))
            .load()?;
        Ok(Self::new(settings))
    }

    /// The base settings with every flag in `cli` applied, revalidated.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut settings = self.base_config.clone();

        if cli.verbose {
            settings.logger.level = "debug".to_string();
        } else if cli.quiet {
            settings.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                settings.server.host = host.clone();
            }
            if let Some(port) = port {
                settings.server.port = *port;
            }
            if let Some(level) = log_level {
                settings.logger.level = level.as_str().to_string();
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
