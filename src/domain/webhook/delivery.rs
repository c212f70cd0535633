//! Delivery outcome types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, OrganizationId, SubscriptionId, Timestamp};

use super::{WebhookEvent, WebhookEventType};

/// Outcome of a single HTTP attempt against one subscriber.
///
/// The delivery engine's retry loop consumes these instead of routing
/// control flow through errors: only `RetryableFailure` schedules another
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response.
    Success { status: u16 },
    /// 5xx, 429, or a transport-level failure (no status observed).
    RetryableFailure {
        status: Option<u16>,
        error: String,
    },
    /// Any other non-2xx response; never retried.
    TerminalFailure { status: u16, error: String },
}

impl AttemptOutcome {
    /// Classifies an observed HTTP status code.
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            return AttemptOutcome::Success { status };
        }
        let error = format!("HTTP {}: {}", status, status_text(status));
        if status >= 500 || status == 429 {
            AttemptOutcome::RetryableFailure {
                status: Some(status),
                error,
            }
        } else {
            AttemptOutcome::TerminalFailure { status, error }
        }
    }

    /// Classifies a transport-level failure (DNS, connect, timeout).
    pub fn from_transport_error(error: impl Into<String>) -> Self {
        AttemptOutcome::RetryableFailure {
            status: None,
            error: error.into(),
        }
    }

    /// Whether this outcome permits another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::RetryableFailure { .. })
    }
}

fn status_text(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
}

/// Final outcome of one delivery (all attempts) to one subscriber.
///
/// Only the last attempt is reflected here; intermediate retries surface
/// as log events. Field names are the wire/log contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    #[serde(rename = "subscriptionId")]
    pub subscription_id: SubscriptionId,

    pub success: bool,

    /// Last observed HTTP status; `None` when every attempt failed before
    /// a response arrived.
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Total elapsed time for the delivery, backoff sleeps included.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl DeliveryResult {
    /// Creates a successful result.
    pub fn succeeded(subscription_id: SubscriptionId, status_code: u16, duration_ms: u64) -> Self {
        Self {
            subscription_id,
            success: true,
            status_code: Some(status_code),
            error: None,
            duration_ms,
        }
    }

    /// Creates a failed result with the last observed status, if any.
    pub fn failed(
        subscription_id: SubscriptionId,
        status_code: Option<u16>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            subscription_id,
            success: false,
            status_code,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Durable audit record: one per dispatched event, holding every
/// subscriber's final result in subscription order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    #[serde(rename = "eventId")]
    pub event_id: EventId,

    #[serde(rename = "eventType")]
    pub event_type: WebhookEventType,

    #[serde(rename = "organizationId")]
    pub organization_id: OrganizationId,

    pub timestamp: Timestamp,

    pub results: Vec<DeliveryResult>,
}

impl DeliveryLogEntry {
    /// Builds the log entry for a dispatched event.
    pub fn new(event: &WebhookEvent, results: Vec<DeliveryResult>) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type,
            organization_id: event.organization_id.clone(),
            timestamp: Timestamp::now(),
            results,
        }
    }
}
