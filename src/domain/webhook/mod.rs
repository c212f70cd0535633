//! Webhook domain - events, subscriptions, signatures, delivery outcomes.

mod delivery;
mod event;
mod event_type;
pub mod signature;
mod subscription;

pub use delivery::{AttemptOutcome, DeliveryLogEntry, DeliveryResult};
pub use event::WebhookEvent;
pub use event_type::WebhookEventType;
pub use subscription::{NewSubscription, RetryConfig, SubscriptionSecret, WebhookSubscription};
