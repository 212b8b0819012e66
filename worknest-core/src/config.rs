//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_ORGANIZATION_ID, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_VERIFY_BASE_DELAY_MS, DEFAULT_VERIFY_MAX_ATTEMPTS,
};
use crate::error::{WorknestError, WorknestResult};
use crate::retry::RetryPolicy;

const ENV_PREFIX: &str = "WORKNEST";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_organization_id() -> String {
    DEFAULT_ORGANIZATION_ID.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_verify_max_attempts() -> usize {
    DEFAULT_VERIFY_MAX_ATTEMPTS
}

fn default_verify_base_delay_ms() -> u64 {
    DEFAULT_VERIFY_BASE_DELAY_MS
}

/// Configuration at ~/.config/worknest/config.toml, overridable with
/// `WORKNEST_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorknestConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tenant token used when no organization id is known locally.
    #[serde(default = "default_organization_id")]
    pub default_organization_id: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_verify_max_attempts")]
    pub verify_max_attempts: usize,

    #[serde(default = "default_verify_base_delay_ms")]
    pub verify_base_delay_ms: u64,

    /// Bearer token sent with every request, if the backend wants one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_path: Option<PathBuf>,
}

impl Default for WorknestConfig {
    fn default() -> Self {
        WorknestConfig {
            base_url: default_base_url(),
            default_organization_id: default_organization_id(),
            request_timeout_secs: default_request_timeout_secs(),
            verify_max_attempts: default_verify_max_attempts(),
            verify_base_delay_ms: default_verify_base_delay_ms(),
            access_token: None,
            session_path: None,
        }
    }
}

impl WorknestConfig {
    pub fn config_path() -> WorknestResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WorknestError::Config("Could not determine config directory".into()))?
            .join("worknest");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default config path plus environment overrides.
    pub fn load() -> WorknestResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path` (missing file is fine) plus environment overrides.
    pub fn load_from(path: &Path) -> WorknestResult<Self> {
        Self::load_layers(path, Some(config::Environment::with_prefix(ENV_PREFIX)))
    }

    /// Only what is written in `path`, without environment overrides.
    pub fn load_file(path: &Path) -> WorknestResult<Self> {
        Self::load_layers(path, None)
    }

    fn load_layers(path: &Path, environment: Option<config::Environment>) -> WorknestResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::File::from(path).required(false));
        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }

        let settings = builder
            .build()
            .map_err(|e| WorknestError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| WorknestError::Config(e.to_string()))
    }

    /// Change the settings stored in `path` and write them back. Environment
    /// overrides are neither read nor persisted.
    pub fn update_file(path: &Path, change: impl FnOnce(&mut Self)) -> WorknestResult<Self> {
        let mut config = Self::load_file(path)?;
        change(&mut config);
        config.save_to(path)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn verify_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.verify_max_attempts,
            Duration::from_millis(self.verify_base_delay_ms),
        )
    }

    /// Where session facts live: configured path, else <data_dir>/worknest/session.json
    pub fn session_path(&self) -> WorknestResult<PathBuf> {
        if let Some(path) = &self.session_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| WorknestError::Config("Could not determine data directory".into()))?;

        Ok(data_dir.join("worknest").join("session.json"))
    }

    /// Write every setting to `path` as TOML, replacing the file.
    pub fn save_to(&self, path: &Path) -> WorknestResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| WorknestError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)
            .map_err(|e| WorknestError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> WorknestResult<()> {
        let contents = format!(
            "\
# worknest configuration

# Backend API root:
# base_url = \"{DEFAULT_BASE_URL}\"

# Tenant used when no organization is stored in the session:
# default_organization_id = \"{DEFAULT_ORGANIZATION_ID}\"

# Seconds before an API request is abandoned:
# request_timeout_secs = {DEFAULT_REQUEST_TIMEOUT_SECS}

# Reads of a saved event before participant verification gives up:
# verify_max_attempts = {DEFAULT_VERIFY_MAX_ATTEMPTS}
# verify_base_delay_ms = {DEFAULT_VERIFY_BASE_DELAY_MS}

# Bearer token for the backend:
# access_token = \"...\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WorknestError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| WorknestError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorknestConfig::load_from(&dir.path().join("nope.toml")).unwrap();

        assert_eq!(config.default_organization_id, DEFAULT_ORGANIZATION_ID);
        assert_eq!(config.verify_max_attempts, DEFAULT_VERIFY_MAX_ATTEMPTS);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://work.example.com/api\"\nverify_max_attempts = 2\n",
        )
        .unwrap();

        let config = WorknestConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, "https://work.example.com/api");
        assert_eq!(config.verify_max_attempts, 2);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn commented_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worknest").join("config.toml");
        WorknestConfig::create_default_config(&path).unwrap();

        let config = WorknestConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = WorknestConfig {
            default_organization_id: "acme".into(),
            access_token: Some("secret".into()),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = WorknestConfig::load_from(&path).unwrap();

        assert_eq!(loaded.default_organization_id, "acme");
        assert_eq!(loaded.access_token.as_deref(), Some("secret"));
        assert_eq!(loaded.session_path, None);
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "access_token = \"from-file\"\n").unwrap();

        let environment = config::Environment::with_prefix(ENV_PREFIX).source(Some(
            [("WORKNEST_ACCESS_TOKEN".to_string(), "from-env".to_string())]
                .into_iter()
                .collect(),
        ));
        let layered = WorknestConfig::load_layers(&path, Some(environment)).unwrap();
        assert_eq!(layered.access_token.as_deref(), Some("from-env"));

        let file_only = WorknestConfig::load_file(&path).unwrap();
        assert_eq!(file_only.access_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn update_file_keeps_other_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"https://work.example.com/api\"\n").unwrap();

        WorknestConfig::update_file(&path, |config| {
            config.default_organization_id = "acme".into();
        })
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("access_token"));

        let loaded = WorknestConfig::load_file(&path).unwrap();
        assert_eq!(loaded.base_url, "https://work.example.com/api");
        assert_eq!(loaded.default_organization_id, "acme");
        assert_eq!(loaded.access_token, None);
    }
}
