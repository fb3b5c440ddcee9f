//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (TOML/YAML/JSON)
//! - Environment variables (including a `.env` file)
//!
//! Panel credentials live in an ordered list of profiles; a profile's
//! position in that list is the credential index handed to the transport.

use crate::error::{Error, Result};
use crate::logging::redaction::mask_key;
use pterodactyl_core::{
    ApiKind, ClientConfig, CredentialSet, RateLimitConfig, RetryPolicy, StaticCredentialResolver,
    TimeoutConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PANEL_URL: &str = "PTERODACTYL_PANEL_URL";
pub const ENV_CLIENT_API_KEY: &str = "PTERODACTYL_CLIENT_API_KEY";
pub const ENV_APPLICATION_API_KEY: &str = "PTERODACTYL_APPLICATION_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profile used when `--profile` is not given; the first one otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Transport tuning
    pub transport: TransportSettings,

    /// Output settings
    pub output: OutputConfig,

    /// Configured panels, in credential index order
    pub profiles: Vec<Profile>,
}

/// One panel and its API keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub panel_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_api_key: Option<String>,
}

/// Transport tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Retries after the first attempt on HTTP 429
    pub max_retries: u32,
    /// First retry delay in milliseconds, doubled per retry
    pub base_delay_ms: u64,
    /// Client API requests per window and key
    pub client_budget: u32,
    /// Application API requests per window and key
    pub application_budget: u32,
    /// Rate limit window in seconds
    pub window_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let rate_limit = RateLimitConfig::default();
        let timeout = TimeoutConfig::default();

        Self {
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            client_budget: rate_limit.budget_for(ApiKind::Client),
            application_budget: rate_limit.budget_for(ApiKind::Application),
            window_secs: rate_limit.window.as_secs(),
            connect_timeout_secs: timeout.connect_timeout.as_secs(),
            request_timeout_secs: timeout.request_timeout.as_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Profile {
    pub fn new(name: impl Into<String>, panel_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panel_url: panel_url.into(),
            ..Default::default()
        }
    }

    fn credential_set(&self) -> CredentialSet {
        CredentialSet {
            panel_url: self.panel_url.clone(),
            client_api_key: self.client_api_key.clone(),
            application_api_key: self.application_api_key.clone(),
        }
    }
}

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    fn from_extension(extension: Option<&str>) -> Self {
        match extension {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }

    fn from_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|s| s.to_str()))
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Failed to load config: {}", e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Default configuration file paths, in lookup order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".pterodactyl.toml"),
            PathBuf::from(".pterodactyl.yaml"),
            PathBuf::from(".pterodactyl.json"),
        ];

        if let Some(dir) = Self::user_config_dir() {
            paths.push(dir.join("config.toml"));
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
        }

        paths
    }

    /// `<config dir>/pterodactyl`
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pterodactyl"))
    }

    /// Patch the default profile from `PTERODACTYL_*` variables.
    ///
    /// With no profiles configured, a panel URL from the environment creates
    /// a `default` profile.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let panel_url = lookup(ENV_PANEL_URL).filter(|v| !v.trim().is_empty());
        let client_key = lookup(ENV_CLIENT_API_KEY).filter(|v| !v.trim().is_empty());
        let application_key = lookup(ENV_APPLICATION_API_KEY).filter(|v| !v.trim().is_empty());

        if panel_url.is_none() && client_key.is_none() && application_key.is_none() {
            return;
        }

        if self.profiles.is_empty() {
            self.profiles.push(Profile::new("default", ""));
        }

        let index = self.profile_index(None).unwrap_or(0);
        let Some(profile) = self.profiles.get_mut(index) else {
            return;
        };

        if let Some(url) = panel_url {
            profile.panel_url = url;
        }
        if let Some(key) = client_key {
            profile.client_api_key = Some(key);
        }
        if let Some(key) = application_key {
            profile.application_api_key = Some(key);
        }
        tracing::debug!(profile = %profile.name, "Applied environment overrides");
    }

    /// Credential index of `name`, or of the default profile
    pub fn profile_index(&self, name: Option<&str>) -> Result<usize> {
        let wanted = name.or(self.default_profile.as_deref());

        match wanted {
            Some(wanted) => self
                .profiles
                .iter()
                .position(|p| p.name == wanted)
                .ok_or_else(|| Error::ProfileNotFound {
                    name: wanted.to_string(),
                }),
            None if self.profiles.is_empty() => Err(Error::config(format!(
                "No profiles configured. Run 'pterodactyl config init' or set {} and an API key",
                ENV_PANEL_URL
            ))),
            None => Ok(0),
        }
    }

    /// Resolver over every profile, in order
    pub fn credential_resolver(&self) -> StaticCredentialResolver {
        StaticCredentialResolver::new(self.profiles.iter().map(Profile::credential_set).collect())
    }

    /// Transport configuration built from `[transport]`
    pub fn client_config(&self) -> ClientConfig {
        let t = &self.transport;
        let rate_limit = RateLimitConfig::new(
            Duration::from_secs(t.window_secs),
            t.client_budget,
            t.application_budget,
        );

        ClientConfig::default()
            .with_retry_policy(
                RetryPolicy::new(t.max_retries).with_base_delay(Duration::from_millis(t.base_delay_ms)),
            )
            .with_rate_limit(rate_limit)
            .with_timeout(TimeoutConfig::new(
                Duration::from_secs(t.connect_timeout_secs),
                Duration::from_secs(t.request_timeout_secs),
            ))
    }

    /// Every problem found, empty when the configuration is usable
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.client_config().validate() {
            problems.push(format!("transport: {}", e));
        }

        if let Some(name) = &self.default_profile {
            if !self.profiles.iter().any(|p| &p.name == name) {
                problems.push(format!("default_profile '{}' does not match any profile", name));
            }
        }

        for (index, profile) in self.profiles.iter().enumerate() {
            let label = if profile.name.is_empty() {
                format!("profile #{}", index)
            } else {
                format!("profile '{}'", profile.name)
            };

            if profile.name.trim().is_empty() {
                problems.push(format!("{}: name is empty", label));
            }
            if self.profiles[..index].iter().any(|p| p.name == profile.name) {
                problems.push(format!("{}: duplicate name", label));
            }
            if profile.panel_url.trim().is_empty() {
                problems.push(format!("{}: panel_url is empty", label));
            } else if url::Url::parse(profile.panel_url.trim()).is_err() {
                problems.push(format!("{}: panel_url '{}' is not a valid URL", label, profile.panel_url));
            }
            if profile.client_api_key.is_none() && profile.application_api_key.is_none() {
                problems.push(format!("{}: no API key configured", label));
            }
        }

        problems
    }

    /// Copy with API keys masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for profile in &mut config.profiles {
            profile.client_api_key = profile.client_api_key.as_deref().map(mask_key);
            profile.application_api_key = profile.application_api_key.as_deref().map(mask_key);
        }
        config
    }

    /// Serialize as `toml`, `yaml` or `json`
    pub fn render(&self, extension: &str) -> Result<String> {
        self.render_as(FileFormat::from_extension(Some(extension)))
    }

    fn render_as(&self, format: FileFormat) -> Result<String> {
        let content = match format {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };
        Ok(content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render_as(FileFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Starter configuration written by `config init`
    pub fn starter() -> Self {
        Self {
            default_profile: Some("default".to_string()),
            profiles: vec![Profile {
                name: "default".to_string(),
                panel_url: "https://panel.example.com".to_string(),
                client_api_key: Some("ptlc_replace_me".to_string()),
                application_api_key: None,
            }],
            ..Default::default()
        }
    }
}
