//! Layered configuration loading: embedded defaults → user file →
//! environment → explicit overrides (SPEC_FULL.md §0).

use crate::domain::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, FileFormat};
use std::path::Path;
use validator::Validate;

use super::types::AgentBrainConfig;

/// Embedded default settings, compiled into the binary so the daemon has
/// sane defaults regardless of working directory.
const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config/default.toml");

/// Returns the embedded default config TOML, exposed for tests that verify
/// parsing of the shipped defaults.
pub fn get_default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

/// Loads [`AgentBrainConfig`] from embedded defaults, an optional settings
/// file, and `AGENT_BRAIN__`-prefixed environment variables, validating the
/// result (spec §4.1: "unreadable settings ⇒ `ConfigError`").
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from embedded defaults and environment variables
    /// only (no project settings file).
    pub fn load(&self) -> Result<AgentBrainConfig> {
        self.build(None)
    }

    /// Load configuration layering a project settings file between the
    /// embedded defaults and the environment.
    pub fn load_with_file(&self, path: &Path) -> Result<AgentBrainConfig> {
        self.build(Some(path))
    }

    fn build(&self, path: Option<&Path>) -> Result<AgentBrainConfig> {
        let mut builder = ConfigBuilder::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG_TOML,
            FileFormat::Toml,
        ));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("AGENT_BRAIN")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        let config: AgentBrainConfig = built
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;

        config
            .validate()
            .map_err(|e| Error::config(format!("configuration validation failed: {e}")))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse_and_validate() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.embedding.provider, "null");
        assert_eq!(config.lifecycle.port_range_start, 8700);
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[embedding]\nprovider = \"http\"\nmodel = \"m\"\ndimensions = 512\nbatch_size = 50\n")
            .unwrap();
        let config = ConfigLoader::new().load_with_file(&path).unwrap();
        assert_eq!(config.embedding.provider, "http");
        assert_eq!(config.embedding.dimensions, 512);
        // Untouched sections keep their embedded defaults.
        assert_eq!(config.lifecycle.port_range_start, 8700);
    }
}
