//! Webhook delivery configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Webhook delivery configuration
///
/// Retry policy is per-subscription data, not deployment configuration;
/// only the per-attempt HTTP timeout is tuned here.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Per-attempt HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl DeliveryConfig {
    /// Get the per-attempt timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate delivery configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
