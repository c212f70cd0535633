//! DeliveryLogRepository port - Append-only audit log of dispatched events.
//!
//! One entry per dispatched event, written after all deliveries have
//! settled. Retention/pruning is an external concern; nothing here reads
//! the log back except administrative tooling.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::DeliveryLogEntry;

/// Port for persisting delivery log entries.
#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    /// Appends one entry. Never called for dispatches that matched zero
    /// subscriptions.
    async fn append(&self, entry: &DeliveryLogEntry) -> Result<(), DomainError>;
}
