//! Application Configuration
//!
//! JSON settings file. Every field has a default, so a missing file or a
//! partial one both load.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reminder::ReminderPolicy;

/// One year
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 525_600;
/// One day
pub const MAX_IMMEDIATE_FIRE_DELAY_SECS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Prefix of the daily log files
    pub app_name: String,
    /// File logging is off when unset
    pub log_dir: Option<PathBuf>,
    pub reminder_lead_minutes: i64,
    pub immediate_fire_delay_secs: i64,
    pub reminder_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = ReminderPolicy::default();
        Self {
            app_name: "Questline".to_string(),
            log_dir: None,
            reminder_lead_minutes: policy.lead.num_minutes(),
            immediate_fire_delay_secs: policy.immediate_delay.num_seconds(),
            reminder_title: policy.title,
        }
    }
}

impl AppConfig {
    /// Read the config at `path`; defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write pretty JSON through a temp file so readers never see half a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("appName must not be blank".to_string()));
        }
        if !(1..=MAX_REMINDER_LEAD_MINUTES).contains(&self.reminder_lead_minutes) {
            return Err(ConfigError::Invalid(format!(
                "reminderLeadMinutes must be between 1 and {MAX_REMINDER_LEAD_MINUTES}, got {}",
                self.reminder_lead_minutes
            )));
        }
        if !(1..=MAX_IMMEDIATE_FIRE_DELAY_SECS).contains(&self.immediate_fire_delay_secs) {
            return Err(ConfigError::Invalid(format!(
                "immediateFireDelaySecs must be between 1 and {MAX_IMMEDIATE_FIRE_DELAY_SECS}, got {}",
                self.immediate_fire_delay_secs
            )));
        }
        Ok(())
    }

    /// Timing values outside the accepted range are clamped into it
    pub fn reminder_policy(&self) -> ReminderPolicy {
        let lead = self.reminder_lead_minutes.clamp(1, MAX_REMINDER_LEAD_MINUTES);
        let delay = self.immediate_fire_delay_secs.clamp(1, MAX_IMMEDIATE_FIRE_DELAY_SECS);
        ReminderPolicy {
            lead: Duration::minutes(lead),
            immediate_delay: Duration::seconds(delay),
            title: self.reminder_title.clone(),
        }
    }
}
