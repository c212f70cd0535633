//! HTTP adapter for webhook management endpoints.
//!
//! Exposes subscription management and test deliveries via REST API:
//! - `POST /api/webhooks` - Register a new webhook subscription
//! - `GET /api/webhooks` - List the organization's subscriptions
//! - `DELETE /api/webhooks/:id` - Remove a subscription
//! - `POST /api/webhooks/:id/test` - Deliver a test event to one subscription
//! - `GET /api/webhooks/event-types` - Catalog of subscribable event types

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{OrganizationContext, WebhookApiError, WebhookAppState};
pub use routes::webhook_routes;
