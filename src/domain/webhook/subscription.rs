//! Webhook subscription aggregate.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrganizationId, SubscriptionId, Timestamp, ValidationError};

use super::WebhookEventType;

/// Shared signing key for one subscription.
///
/// Set exactly once at creation and never exposed by listing APIs. The
/// inner [`SecretString`] keeps it out of Debug output and log captures.
#[derive(Clone)]
pub struct SubscriptionSecret(SecretString);

impl SubscriptionSecret {
    /// Wraps a caller-supplied secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::new(secret.into()))
    }

    /// Generates a fresh secret: 32 random bytes, hex-encoded.
    ///
    /// Uses `OsRng` directly from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(SecretString::new(hex))
    }

    /// Returns the secret material for signing and persistence.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SubscriptionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionSecret([REDACTED])")
    }
}

/// Per-subscription retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt (so total attempts = max_retries + 1).
    #[serde(rename = "maxRetries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay; attempt n waits `retry_delay_ms * 2^n`.
    #[serde(rename = "retryDelayMs", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// A tenant-owned record describing where and for which event types to
/// deliver webhooks, plus its delivery-health bookkeeping.
#[derive(Debug, Clone)]
pub struct WebhookSubscription {
    pub id: SubscriptionId,
    pub organization_id: OrganizationId,
    pub url: String,
    pub events: Vec<WebhookEventType>,
    pub secret: SubscriptionSecret,
    pub active: bool,
    /// Static headers attached to every delivery. Reserved delivery headers
    /// always win over entries here.
    pub headers: Option<HashMap<String, String>>,
    pub retry_config: RetryConfig,
    /// Consecutive failed deliveries; reset to zero on success.
    pub failure_count: u32,
    pub last_success_at: Option<Timestamp>,
    pub last_triggered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WebhookSubscription {
    /// Checks whether this subscription wants the given event type.
    pub fn subscribes_to(&self, event_type: WebhookEventType) -> bool {
        self.events.contains(&event_type)
    }
}

/// Caller-supplied fields for creating a subscription.
///
/// Everything the registry fills in itself (id, secret when absent, health
/// counters, timestamps) is deliberately not here.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub organization_id: OrganizationId,
    pub url: String,
    pub events: Vec<WebhookEventType>,
    pub secret: Option<String>,
    pub active: Option<bool>,
    pub headers: Option<HashMap<String, String>>,
    pub retry_config: Option<RetryConfig>,
}

impl NewSubscription {
    /// Validates the caller-controlled fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::empty_field("url"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::invalid_format(
                "url",
                "must start with http:// or https://",
            ));
        }
        if self.events.is_empty() {
            return Err(ValidationError::empty_field("events"));
        }
        if let Some(secret) = &self.secret {
            if secret.is_empty() {
                return Err(ValidationError::empty_field("secret"));
            }
        }
        Ok(())
    }
}
