//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::compute::{ServerRequest, WaitPolicy};
use crate::scenario::ScenarioConfig;

/// Compute endpoint, credentials, flavors and capability flags derived from
/// defaults, configuration files and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "KESTREL",
    discovery(
        app_name = "kestrel",
        env_var = "KESTREL_CONFIG_PATH",
        config_file_name = "kestrel.toml",
        dotfile_name = ".kestrel.toml",
        project_file_name = "kestrel.toml"
    )
)]
pub struct ComputeConfig {
    /// Base URL of the compute API, including the version segment (for
    /// example `http://controller:8774/v2.1`).
    pub endpoint: String,
    /// Token sent as `X-Auth-Token` with every request.
    pub auth_token: String,
    /// Image used to boot scenario servers.
    pub image_ref: String,
    /// Flavor scenario servers are created with.
    #[ortho_config(default = "1".to_owned())]
    pub flavor_ref: String,
    /// Flavor used as the resize target. Must differ from `flavor_ref`.
    #[ortho_config(default = "2".to_owned())]
    pub flavor_ref_alt: String,
    /// Whether the deployment supports resizing servers.
    #[ortho_config(default = false)]
    pub resize_enabled: bool,
    /// Whether the deployment supports suspending servers.
    #[ortho_config(default = true)]
    pub suspend_enabled: bool,
    /// Seconds between two status polls.
    #[ortho_config(default = 1)]
    pub build_interval_secs: u64,
    /// Seconds allowed for a server to reach a status.
    #[ortho_config(default = 300)]
    pub build_timeout_secs: u64,
    /// Prefix for generated server names.
    #[ortho_config(default = "kestrel".to_owned())]
    pub name_prefix: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ComputeConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to kestrel.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("kestrel")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and TOML key that supply each missing value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is blank
    /// and [`ConfigError::Invalid`] when the polling window is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.endpoint,
            &FieldMetadata::new("compute endpoint", "KESTREL_ENDPOINT", "endpoint"),
        )?;
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("auth token", "KESTREL_AUTH_TOKEN", "auth_token"),
        )?;
        Self::require_field(
            &self.image_ref,
            &FieldMetadata::new("boot image", "KESTREL_IMAGE_REF", "image_ref"),
        )?;
        Self::require_field(
            &self.flavor_ref,
            &FieldMetadata::new("flavor", "KESTREL_FLAVOR_REF", "flavor_ref"),
        )?;
        Self::require_field(
            &self.flavor_ref_alt,
            &FieldMetadata::new(
                "alternate flavor",
                "KESTREL_FLAVOR_REF_ALT",
                "flavor_ref_alt",
            ),
        )?;
        Self::require_field(
            &self.name_prefix,
            &FieldMetadata::new("server name prefix", "KESTREL_NAME_PREFIX", "name_prefix"),
        )?;

        if self.build_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "build_interval_secs must be greater than zero",
            )));
        }
        if self.build_timeout_secs < self.build_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "build_timeout_secs ({}) must not be shorter than build_interval_secs ({})",
                self.build_timeout_secs, self.build_interval_secs
            )));
        }
        Ok(())
    }

    /// Projects the flavor pair and capability flags consumed by the
    /// scenario driver.
    #[must_use]
    pub fn scenario_config(&self) -> ScenarioConfig {
        ScenarioConfig {
            flavor_ref: self.flavor_ref.clone(),
            flavor_ref_alt: self.flavor_ref_alt.clone(),
            resize_enabled: self.resize_enabled,
            suspend_enabled: self.suspend_enabled,
        }
    }

    /// Returns the polling policy for status waits.
    #[must_use]
    pub const fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.build_interval_secs),
            Duration::from_secs(self.build_timeout_secs),
        )
    }

    /// Builds a request for a uniquely named scenario server.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the request fails validation.
    pub fn server_request(&self) -> Result<ServerRequest, ConfigError> {
        ServerRequest::builder()
            .name(format!(
                "{}-{}",
                self.name_prefix.trim(),
                Uuid::new_v4().simple()
            ))
            .image_ref(&self.image_ref)
            .flavor_ref(&self.flavor_ref)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
