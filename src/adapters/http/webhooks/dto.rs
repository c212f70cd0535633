//! HTTP DTOs (Data Transfer Objects) for webhook management endpoints.
//!
//! These types define the JSON request/response structure for the webhook API.
//! They serve as the boundary between HTTP and the application layer. Field
//! names follow the wire contract (camelCase), so renames here are load-bearing.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrganizationId, SubscriptionId};
use crate::domain::webhook::{DeliveryResult, RetryConfig, WebhookEventType, WebhookSubscription};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a new webhook subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Endpoint URL deliveries are POSTed to.
    pub url: String,
    /// Event types to subscribe to (dotted tags, e.g. `patient.created`).
    pub events: Vec<WebhookEventType>,
    /// Optional signing secret; one is generated when omitted.
    #[serde(default)]
    pub secret: Option<String>,
    /// Whether the subscription starts active (defaults to true).
    #[serde(default)]
    pub active: Option<bool>,
    /// Static headers to attach to every delivery.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Retry policy override.
    #[serde(default, rename = "retryConfig")]
    pub retry_config: Option<RetryConfig>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A webhook subscription as returned by the API.
///
/// The signing secret appears only in the creation response; every other
/// endpoint uses the redacted form.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Owning organization.
    #[serde(rename = "organizationId")]
    pub organization_id: OrganizationId,
    /// Endpoint URL.
    pub url: String,
    /// Subscribed event types.
    pub events: Vec<WebhookEventType>,
    /// Whether deliveries are currently enabled.
    pub active: bool,
    /// Static subscriber headers, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Retry policy.
    #[serde(rename = "retryConfig")]
    pub retry_config: RetryConfig,
    /// Consecutive failed deliveries.
    #[serde(rename = "failureCount")]
    pub failure_count: u32,
    /// Last successful delivery (ISO 8601).
    #[serde(rename = "lastSuccessAt", skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<String>,
    /// Last delivery attempt of any outcome (ISO 8601).
    #[serde(rename = "lastTriggeredAt", skip_serializing_if = "Option::is_none")]
    pub last_triggered_at: Option<String>,
    /// When the subscription was created (ISO 8601).
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// When the subscription was last updated (ISO 8601).
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    /// Signing secret; present only in the creation response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl SubscriptionResponse {
    /// Response without the secret, for list and lookup endpoints.
    pub fn redacted(subscription: &WebhookSubscription) -> Self {
        Self::build(subscription, None)
    }

    /// Creation response carrying the secret. This is the only time the
    /// API ever returns it.
    pub fn with_secret(subscription: &WebhookSubscription) -> Self {
        let secret = subscription.secret.expose().to_string();
        Self::build(subscription, Some(secret))
    }

    fn build(subscription: &WebhookSubscription, secret: Option<String>) -> Self {
        Self {
            id: subscription.id,
            organization_id: subscription.organization_id.clone(),
            url: subscription.url.clone(),
            events: subscription.events.clone(),
            active: subscription.active,
            headers: subscription.headers.clone(),
            retry_config: subscription.retry_config,
            failure_count: subscription.failure_count,
            last_success_at: subscription
                .last_success_at
                .map(|t| t.as_datetime().to_rfc3339()),
            last_triggered_at: subscription
                .last_triggered_at
                .map(|t| t.as_datetime().to_rfc3339()),
            created_at: subscription.created_at.as_datetime().to_rfc3339(),
            updated_at: subscription.updated_at.as_datetime().to_rfc3339(),
            secret,
        }
    }
}

/// Response for the subscription list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ListSubscriptionsResponse {
    /// The organization's subscriptions, newest first.
    pub subscriptions: Vec<SubscriptionResponse>,
}

/// Response for the test delivery endpoint: the final outcome of one
/// delivery, retries included.
#[derive(Debug, Clone, Serialize)]
pub struct TestDeliveryResponse {
    /// Whether the delivery ultimately succeeded.
    pub success: bool,
    /// Last observed HTTP status, if a response arrived.
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Final error, when the delivery failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Total elapsed time in milliseconds.
    pub duration: u64,
}

impl From<DeliveryResult> for TestDeliveryResponse {
    fn from(result: DeliveryResult) -> Self {
        Self {
            success: result.success,
            status_code: result.status_code,
            error: result.error,
            duration: result.duration_ms,
        }
    }
}

/// One event type in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct EventTypeEntry {
    /// The dotted wire tag.
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    /// Category prefix (the part before the dot).
    pub category: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

/// Response for the event type catalog: subscribable types grouped by
/// category.
#[derive(Debug, Clone, Serialize)]
pub struct EventTypesResponse {
    #[serde(rename = "eventTypes")]
    pub event_types: BTreeMap<&'static str, Vec<EventTypeEntry>>,
}

impl EventTypesResponse {
    /// Builds the catalog from the subscribable event types.
    pub fn catalog() -> Self {
        let mut event_types: BTreeMap<&'static str, Vec<EventTypeEntry>> = BTreeMap::new();
        for event_type in WebhookEventType::all() {
            event_types
                .entry(event_type.category())
                .or_default()
                .push(EventTypeEntry {
                    event_type: *event_type,
                    category: event_type.category(),
                    description: event_type.description(),
                });
        }
        Self { event_types }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error envelope for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Code and message carried inside the error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
