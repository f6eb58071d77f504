//! Configuration Loader
//!
//! Environment-aware configuration loading: base file, environment-specific
//! override file, then `UPDATES__*` environment variables.

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::UpdatesConfig;
use crate::logging::get_environment;

const CONFIG_FILE_STEM: &str = "updates-config";

/// Loaded configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: UpdatesConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = get_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let mut config = Self::build_config(&config_directory, environment)?;
        config.environment = environment.to_string();

        // Validate the loaded configuration
        config.validate()?;

        debug!(
            environment = %environment,
            channel_capacity = config.events.channel_capacity,
            buffer_limit = config.events.buffer_limit,
            error_store = ?config.error_store.kind,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &UpdatesConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn build_config(config_directory: &Path, environment: &str) -> ConfigResult<UpdatesConfig> {
        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.yaml"));
        let env_file = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.yaml"));

        let settings = Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix("UPDATES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(config_directory, e))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error(config_directory, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorStoreKind;
    use crate::state_machine::IllegalTransitionPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config_yaml() -> &'static str {
        r#"
state_machine:
  illegal_transition_policy: reject

events:
  channel_capacity: 32

error_store:
  kind: memory

logging:
  json: false
"#
    }

    fn setup_test_config_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().to_path_buf();
        fs::write(
            config_dir.join("updates-config.yaml"),
            create_test_config_yaml(),
        )
        .unwrap();

        (temp_dir, config_dir)
    }

    #[test]
    fn test_basic_config_loading() {
        let (_temp_dir, config_dir) = setup_test_config_dir();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(config_dir.clone()), "test").unwrap();

        let config = manager.config();
        assert_eq!(config.events.channel_capacity, 32);
        assert_eq!(config.environment, "test");
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config_directory(), config_dir.as_path());
    }

    #[test]
    fn test_missing_directory_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::load_from_directory_with_env(
            Some(temp_dir.path().join("absent")),
            "development",
        )
        .unwrap();

        assert_eq!(manager.config().events.channel_capacity, 256);
        assert_eq!(manager.config().error_store.kind, ErrorStoreKind::Memory);
    }

    #[test]
    fn test_environment_specific_overrides() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        fs::write(
            config_dir.join("updates-config.production.yaml"),
            r#"
state_machine:
  illegal_transition_policy: debug_assert
error_store:
  kind: file
  path: /var/lib/updates/last-error.json
logging:
  json: true
"#,
        )
        .unwrap();

        let production =
            ConfigManager::load_from_directory_with_env(Some(config_dir.clone()), "production")
                .unwrap();
        let config = production.config();
        assert_eq!(config.events.channel_capacity, 32);
        assert_eq!(config.error_store.kind, ErrorStoreKind::File);
        assert_eq!(
            config.state_machine.illegal_transition_policy,
            IllegalTransitionPolicy::DebugAssert
        );
        assert!(config.logging.json);

        let development =
            ConfigManager::load_from_directory_with_env(Some(config_dir), "development").unwrap();
        assert_eq!(development.config().error_store.kind, ErrorStoreKind::Memory);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        fs::write(
            config_dir.join("updates-config.staging.yaml"),
            "error_store:\n  kind: file\n",
        )
        .unwrap();

        let result = ConfigManager::load_from_directory_with_env(Some(config_dir), "staging");
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }
}
