//! PostgreSQL implementation of DeliveryLogRepository.
//!
//! Appends one audit row per dispatched event. The log is append-only;
//! rows are never updated or deleted by the application.

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::DeliveryLogEntry;
use crate::ports::DeliveryLogRepository;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of the DeliveryLogRepository port.
pub struct PostgresDeliveryLogRepository {
    pool: PgPool,
}

impl PostgresDeliveryLogRepository {
    /// Creates a new PostgresDeliveryLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLogRepository for PostgresDeliveryLogRepository {
    async fn append(&self, entry: &DeliveryLogEntry) -> Result<(), DomainError> {
        let results = serde_json::to_value(&entry.results).map_err(|e| {
            DomainError::new(
                ErrorCode::SerializationError,
                format!("Failed to serialize delivery results: {}", e),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO webhook_delivery_logs (
                event_id, event_type, organization_id, occurred_at, results
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.event_id.as_uuid())
        .bind(entry.event_type.as_str())
        .bind(entry.organization_id.as_str())
        .bind(entry.timestamp.as_datetime())
        .bind(results)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to append delivery log entry: {}", e),
            )
        })?;

        Ok(())
    }
}
