//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionRepository` - Webhook subscription store (CRUD, matching
//!   query, delivery-health bookkeeping)
//! - `DeliveryLogRepository` - Append-only delivery audit log
//! - `WebhookSender` - HTTP egress for individual delivery attempts

mod delivery_log_repository;
mod subscription_repository;
mod webhook_sender;

pub use delivery_log_repository::DeliveryLogRepository;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_sender::{SenderError, SenderResponse, WebhookRequest, WebhookSender};
