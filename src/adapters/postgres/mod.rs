//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresSubscriptionRepository` - Tenant-scoped subscription storage
//! - `PostgresDeliveryLogRepository` - Append-only delivery audit log

mod delivery_log_repository;
mod subscription_repository;

pub use delivery_log_repository::PostgresDeliveryLogRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
