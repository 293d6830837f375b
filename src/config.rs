//! Configuration for p4tagged
//!
//! Centralized configuration with sensible defaults.

use std::sync::Arc;

use crate::classify::AuthRules;
use crate::error::{P4Error, Result};
use crate::protocol::MAX_PAYLOAD_SIZE;

/// Main configuration for a result processor
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Message Configuration
    // -------------------------------------------------------------------------
    /// Separator used when concatenating Info-level texts
    pub info_separator: String,

    /// Ordered auth failure rules (shared, never mutated)
    pub auth_rules: Arc<AuthRules>,

    // -------------------------------------------------------------------------
    // Capture Configuration
    // -------------------------------------------------------------------------
    /// Max size of one captured row frame (in bytes)
    pub max_payload_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            info_separator: "\n".to_string(),
            auth_rules: AuthRules::standard(),
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_size == 0 {
            return Err(P4Error::Config(
                "max_payload_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the separator for concatenated Info texts
    pub fn info_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.info_separator = separator.into();
        self
    }

    /// Replace the auth failure rule table
    pub fn auth_rules(mut self, rules: impl Into<Arc<AuthRules>>) -> Self {
        self.config.auth_rules = rules.into();
        self
    }

    /// Set the maximum capture frame payload (in bytes)
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.config.max_payload_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
