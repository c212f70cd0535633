//! Webhook event type catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Domain occurrences a subscription can filter on.
///
/// Serialized as the dotted wire tag (e.g. `appointment.completed`), which
/// is also what the `X-FisioFlow-Event` header carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "patient.created")]
    PatientCreated,
    #[serde(rename = "patient.updated")]
    PatientUpdated,
    #[serde(rename = "patient.deleted")]
    PatientDeleted,
    #[serde(rename = "appointment.created")]
    AppointmentCreated,
    #[serde(rename = "appointment.updated")]
    AppointmentUpdated,
    #[serde(rename = "appointment.cancelled")]
    AppointmentCancelled,
    #[serde(rename = "appointment.completed")]
    AppointmentCompleted,
    #[serde(rename = "treatment.started")]
    TreatmentStarted,
    #[serde(rename = "treatment.completed")]
    TreatmentCompleted,
    #[serde(rename = "session.completed")]
    SessionCompleted,
    #[serde(rename = "assessment.created")]
    AssessmentCreated,
    #[serde(rename = "assessment.completed")]
    AssessmentCompleted,
    #[serde(rename = "payment.received")]
    PaymentReceived,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "exercise.assigned")]
    ExerciseAssigned,
    #[serde(rename = "exercise.completed")]
    ExerciseCompleted,
    /// Reserved for deliveries fired through the management test endpoint.
    #[serde(rename = "test.event")]
    TestEvent,
}

impl WebhookEventType {
    /// All subscribable event types, in catalog order.
    ///
    /// `TestEvent` is excluded: it can only be fired through the management
    /// API's test endpoint, never subscribed to.
    pub fn all() -> &'static [WebhookEventType] {
        &[
            WebhookEventType::PatientCreated,
            WebhookEventType::PatientUpdated,
            WebhookEventType::PatientDeleted,
            WebhookEventType::AppointmentCreated,
            WebhookEventType::AppointmentUpdated,
            WebhookEventType::AppointmentCancelled,
            WebhookEventType::AppointmentCompleted,
            WebhookEventType::TreatmentStarted,
            WebhookEventType::TreatmentCompleted,
            WebhookEventType::SessionCompleted,
            WebhookEventType::AssessmentCreated,
            WebhookEventType::AssessmentCompleted,
            WebhookEventType::PaymentReceived,
            WebhookEventType::PaymentFailed,
            WebhookEventType::ExerciseAssigned,
            WebhookEventType::ExerciseCompleted,
        ]
    }

    /// The dotted wire tag for this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::PatientCreated => "patient.created",
            WebhookEventType::PatientUpdated => "patient.updated",
            WebhookEventType::PatientDeleted => "patient.deleted",
            WebhookEventType::AppointmentCreated => "appointment.created",
            WebhookEventType::AppointmentUpdated => "appointment.updated",
            WebhookEventType::AppointmentCancelled => "appointment.cancelled",
            WebhookEventType::AppointmentCompleted => "appointment.completed",
            WebhookEventType::TreatmentStarted => "treatment.started",
            WebhookEventType::TreatmentCompleted => "treatment.completed",
            WebhookEventType::SessionCompleted => "session.completed",
            WebhookEventType::AssessmentCreated => "assessment.created",
            WebhookEventType::AssessmentCompleted => "assessment.completed",
            WebhookEventType::PaymentReceived => "payment.received",
            WebhookEventType::PaymentFailed => "payment.failed",
            WebhookEventType::ExerciseAssigned => "exercise.assigned",
            WebhookEventType::ExerciseCompleted => "exercise.completed",
            WebhookEventType::TestEvent => "test.event",
        }
    }

    /// Category prefix (the part before the dot).
    pub fn category(&self) -> &'static str {
        match self {
            WebhookEventType::PatientCreated
            | WebhookEventType::PatientUpdated
            | WebhookEventType::PatientDeleted => "patient",
            WebhookEventType::AppointmentCreated
            | WebhookEventType::AppointmentUpdated
            | WebhookEventType::AppointmentCancelled
            | WebhookEventType::AppointmentCompleted => "appointment",
            WebhookEventType::TreatmentStarted | WebhookEventType::TreatmentCompleted => {
                "treatment"
            }
            WebhookEventType::SessionCompleted => "session",
            WebhookEventType::AssessmentCreated | WebhookEventType::AssessmentCompleted => {
                "assessment"
            }
            WebhookEventType::PaymentReceived | WebhookEventType::PaymentFailed => "payment",
            WebhookEventType::ExerciseAssigned | WebhookEventType::ExerciseCompleted => "exercise",
            WebhookEventType::TestEvent => "test",
        }
    }

    /// Human-readable description shown in the event-type catalog.
    pub fn description(&self) -> &'static str {
        match self {
            WebhookEventType::PatientCreated => "Triggered when a new patient is registered",
            WebhookEventType::PatientUpdated => "Triggered when patient information is updated",
            WebhookEventType::PatientDeleted => "Triggered when a patient is deleted",
            WebhookEventType::AppointmentCreated => "Triggered when an appointment is scheduled",
            WebhookEventType::AppointmentUpdated => "Triggered when an appointment is modified",
            WebhookEventType::AppointmentCancelled => "Triggered when an appointment is cancelled",
            WebhookEventType::AppointmentCompleted => "Triggered when an appointment is completed",
            WebhookEventType::TreatmentStarted => "Triggered when a treatment plan is started",
            WebhookEventType::TreatmentCompleted => "Triggered when a treatment plan is completed",
            WebhookEventType::SessionCompleted => "Triggered when a treatment session is completed",
            WebhookEventType::AssessmentCreated => "Triggered when an assessment is created",
            WebhookEventType::AssessmentCompleted => "Triggered when an assessment is completed",
            WebhookEventType::PaymentReceived => "Triggered when a payment is received",
            WebhookEventType::PaymentFailed => "Triggered when a payment fails",
            WebhookEventType::ExerciseAssigned => {
                "Triggered when exercises are assigned to a patient"
            }
            WebhookEventType::ExerciseCompleted => "Triggered when patient completes exercises",
            WebhookEventType::TestEvent => "Test delivery fired through the management API",
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WebhookEventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient.created" => Ok(WebhookEventType::PatientCreated),
            "patient.updated" => Ok(WebhookEventType::PatientUpdated),
            "patient.deleted" => Ok(WebhookEventType::PatientDeleted),
            "appointment.created" => Ok(WebhookEventType::AppointmentCreated),
            "appointment.updated" => Ok(WebhookEventType::AppointmentUpdated),
            "appointment.cancelled" => Ok(WebhookEventType::AppointmentCancelled),
            "appointment.completed" => Ok(WebhookEventType::AppointmentCompleted),
            "treatment.started" => Ok(WebhookEventType::TreatmentStarted),
            "treatment.completed" => Ok(WebhookEventType::TreatmentCompleted),
            "session.completed" => Ok(WebhookEventType::SessionCompleted),
            "assessment.created" => Ok(WebhookEventType::AssessmentCreated),
            "assessment.completed" => Ok(WebhookEventType::AssessmentCompleted),
            "payment.received" => Ok(WebhookEventType::PaymentReceived),
            "payment.failed" => Ok(WebhookEventType::PaymentFailed),
            "exercise.assigned" => Ok(WebhookEventType::ExerciseAssigned),
            "exercise.completed" => Ok(WebhookEventType::ExerciseCompleted),
            "test.event" => Ok(WebhookEventType::TestEvent),
            _ => Err(ValidationError::invalid_format(
                "event_type",
                format!("unknown event type '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_dotted_tag() {
        let json = serde_json::to_string(&WebhookEventType::AppointmentCompleted).unwrap();
        assert_eq!(json, "\"appointment.completed\"");
    }

    #[test]
    fn deserializes_from_dotted_tag() {
        let parsed: WebhookEventType = serde_json::from_str("\"patient.created\"").unwrap();
        assert_eq!(parsed, WebhookEventType::PatientCreated);
    }

    #[test]
    fn round_trips_through_from_str() {
        for event_type in WebhookEventType::all() {
            let parsed: WebhookEventType = event_type.as_str().parse().unwrap();
            assert_eq!(parsed, *event_type);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result: Result<WebhookEventType, _> = "patient.exploded".parse();
        assert!(result.is_err());
    }

    #[test]
    fn catalog_excludes_test_event() {
        assert_eq!(WebhookEventType::all().len(), 16);
        assert!(!WebhookEventType::all().contains(&WebhookEventType::TestEvent));
    }

    #[test]
    fn category_is_prefix_of_tag() {
        for event_type in WebhookEventType::all() {
            let prefix = event_type.as_str().split('.').next().unwrap();
            assert_eq!(event_type.category(), prefix);
        }
    }

    #[test]
    fn every_type_has_a_description() {
        for event_type in WebhookEventType::all() {
            assert!(!event_type.description().is_empty());
        }
    }
}
