//! Configuration loading (spec.md §6 "Configuration (environment)")
//!
//! Merges, in increasing priority: [`quorum_application::AppConfig::default`],
//! an XDG global config file, a project-local `quorum.toml`/`.quorum.toml`,
//! an explicit `--config` path, and `QUORUM_*` environment variables.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use quorum_application::AppConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),
    #[error(transparent)]
    Validation(#[from] quorum_application::config::ConfigError),
}

pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { explicit_path: None }
    }

    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Load and validate the merged configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigLoadError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(global) = global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        for project_file in ["quorum.toml", ".quorum.toml"] {
            if Path::new(project_file).exists() {
                figment = figment.merge(Toml::file(project_file));
            }
        }

        if let Some(path) = &self.explicit_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("QUORUM_").split("_"));

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quorum-review").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults_with_no_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = ConfigLoader::new().load();
        std::env::set_current_dir(original).unwrap();
        assert!(result.is_ok());
    }
}
