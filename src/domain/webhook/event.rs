//! Webhook event value object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{EventId, OrganizationId, Timestamp, UserId};

use super::WebhookEventType;

/// An immutable domain occurrence, fanned out to subscribers as-is.
///
/// The JSON serialization of this struct is the exact request body delivered
/// to subscribers, so field names are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: EventId,

    #[serde(rename = "type")]
    pub event_type: WebhookEventType,

    /// Arbitrary structured payload supplied by the triggering domain action.
    pub data: Value,

    pub timestamp: Timestamp,

    #[serde(rename = "organizationId")]
    pub organization_id: OrganizationId,

    /// Acting user, when the trigger had one.
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl WebhookEvent {
    /// Creates an event with a fresh id and the current timestamp.
    ///
    /// Pure construction: no I/O, no failure modes.
    pub fn new(
        event_type: WebhookEventType,
        data: Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            data,
            timestamp: Timestamp::now(),
            organization_id,
            user_id,
        }
    }
}
