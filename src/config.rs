//! Reporting configuration
//!
//! Loaded from JSON by the host (or built in code). Every field has a
//! default so partial files are accepted.

use crate::error::{AuditError, Result};
use crate::transport::webhook::parse_webhook_url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced with the account id in [`AuditConfig::profile_url_template`]
pub const PROFILE_ID_PLACEHOLDER: &str = "{id}";

/// Settings for the audit trail and report delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Server name shown as the report sender
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// How long audit events stay in the ledger, in seconds
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Clip length advertised to clients, in seconds
    #[serde(default = "default_clip_duration_secs")]
    pub clip_duration_secs: u64,

    /// Webhook endpoint; reporting is disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Directory holding `<replay>.zip` / `<replay>.json` artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Profile link for the reported client; `{id}` is the account id
    #[serde(default = "default_profile_url_template")]
    pub profile_url_template: String,

    /// Upper bound for one webhook exchange, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_server_name() -> String {
    "Session Host".to_string()
}

fn default_retention_secs() -> u64 {
    60
}

fn default_clip_duration_secs() -> u64 {
    30
}

fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("session-audit").join("reports")
}

fn default_profile_url_template() -> String {
    "https://steamcommunity.com/profiles/{id}".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            retention_secs: default_retention_secs(),
            clip_duration_secs: default_clip_duration_secs(),
            webhook_url: None,
            artifact_dir: default_artifact_dir(),
            profile_url_template: default_profile_url_template(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AuditConfig {
    /// Load from a JSON file; a missing file yields the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AuditError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the service misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        if self.retention_secs == 0 {
            return Err(AuditError::Config(
                "retentionSecs must be greater than zero".to_string(),
            ));
        }

        if !self.profile_url_template.contains(PROFILE_ID_PLACEHOLDER) {
            return Err(AuditError::Config(format!(
                "profileUrlTemplate must contain '{}'",
                PROFILE_ID_PLACEHOLDER
            )));
        }

        if let Some(url) = &self.webhook_url {
            parse_webhook_url(url)?;
        }

        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether a report endpoint is configured
    pub fn reporting_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}
