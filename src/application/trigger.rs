//! WebhookTrigger - Fire-and-forget entry point for event producers.
//!
//! Domain code (patient management, scheduling, billing) calls this after
//! committing its own changes. Dispatch runs on a spawned task so the
//! caller never waits on subscriber endpoints; dispatch failures are
//! logged, not returned.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{EventId, OrganizationId, UserId};
use crate::domain::webhook::{WebhookEvent, WebhookEventType};

use super::WebhookDispatcher;

/// Producer-facing facade over the dispatcher.
pub struct WebhookTrigger {
    dispatcher: Arc<WebhookDispatcher>,
}

impl WebhookTrigger {
    /// Creates a new trigger over the given dispatcher.
    pub fn new(dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Builds an event and dispatches it in the background.
    ///
    /// Returns the new event's id immediately; delivery results are
    /// recorded in the delivery log, not returned to the caller.
    pub fn fire(
        &self,
        event_type: WebhookEventType,
        data: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        let event = WebhookEvent::new(event_type, data, organization_id, user_id);
        let event_id = event.id;
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            if let Err(e) = dispatcher.dispatch(&event).await {
                tracing::error!(
                    error = %e,
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Webhook dispatch failed"
                );
            }
        });

        event_id
    }

    /// Fires `patient.created` with the patient payload.
    pub fn patient_created(
        &self,
        patient: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        self.fire(
            WebhookEventType::PatientCreated,
            json!({ "patient": patient }),
            organization_id,
            user_id,
        )
    }

    /// Fires `appointment.created` with the appointment payload.
    pub fn appointment_created(
        &self,
        appointment: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        self.fire(
            WebhookEventType::AppointmentCreated,
            json!({ "appointment": appointment }),
            organization_id,
            user_id,
        )
    }

    /// Fires `appointment.completed` with the appointment payload.
    pub fn appointment_completed(
        &self,
        appointment: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        self.fire(
            WebhookEventType::AppointmentCompleted,
            json!({ "appointment": appointment }),
            organization_id,
            user_id,
        )
    }

    /// Fires `payment.received` with the payment payload.
    pub fn payment_received(
        &self,
        payment: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        self.fire(
            WebhookEventType::PaymentReceived,
            json!({ "payment": payment }),
            organization_id,
            user_id,
        )
    }

    /// Fires `session.completed` with the session payload.
    pub fn session_completed(
        &self,
        session: serde_json::Value,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
    ) -> EventId {
        self.fire(
            WebhookEventType::SessionCompleted,
            json!({ "session": session }),
            organization_id,
            user_id,
        )
    }
}
