//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application core to external systems:
//! - `delivery` - Outbound HTTP transport (reqwest)
//! - `http` - Inbound management API (axum)
//! - `memory` - In-memory repositories for testing
//! - `postgres` - Persistent storage (sqlx)

pub mod delivery;
pub mod http;
pub mod memory;
pub mod postgres;

pub use delivery::ReqwestWebhookSender;
pub use memory::{InMemoryDeliveryLog, InMemorySubscriptionStore};
pub use postgres::{PostgresDeliveryLogRepository, PostgresSubscriptionRepository};
