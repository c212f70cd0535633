//! Application layer - Webhook delivery services.
//!
//! This layer orchestrates domain operations and coordinates between ports:
//! subscription lifecycle (registry), per-subscriber delivery with retries
//! (engine), per-event fan-out (dispatcher), and the producer-facing
//! fire-and-forget entry point (trigger).

mod dispatcher;
mod engine;
mod registry;
mod trigger;

pub use dispatcher::WebhookDispatcher;
pub use engine::DeliveryEngine;
pub use registry::SubscriptionRegistry;
pub use trigger::WebhookTrigger;
