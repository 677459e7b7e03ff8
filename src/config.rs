//! Configuration for the campaign sending engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_batch_size() -> usize {
    500
}

const fn default_rate_limit_per_minute() -> u32 {
    1200
}

fn default_first_name_fallback() -> String {
    "there".to_owned()
}

/// Configuration consumed by the [`crate::CampaignSender`].
///
/// Every field has a default, so an empty TOML document (or
/// `SenderConfig::default()`) yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Maximum number of messages per outbound batch.
    ///
    /// Also used as the recipient page size, so at most one batch of
    /// recipients is held in memory at a time.
    ///
    /// Default: 500
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum messages per minute handed to the provider.
    ///
    /// Together with `batch_size` this determines the pause applied after
    /// each full batch flush. Values below 1 are treated as 1.
    ///
    /// Default: 1200
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Footer template appended to marketing content.
    ///
    /// May reference `{{unsubscribeUrl}}`, `{{unsubscribeAllUrl}}`, and
    /// `{{physicalAddress}}`. When empty, a literal `Unsubscribe: <url>`
    /// line is used instead.
    #[serde(default)]
    pub unsubscribe_footer: String,

    /// Postal address appended to the fallback footer when non-empty.
    #[serde(default)]
    pub physical_address: String,

    /// Literal substituted for `{{firstName}}` when a subscriber has no
    /// first name on record.
    ///
    /// Default: "there"
    #[serde(default = "default_first_name_fallback")]
    pub first_name_fallback: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            unsubscribe_footer: String::new(),
            physical_address: String::new(),
            first_name_fallback: default_first_name_fallback(),
        }
    }
}

impl SenderConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}
