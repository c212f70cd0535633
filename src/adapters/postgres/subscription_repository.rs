//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Provides persistent storage for webhook subscriptions using PostgreSQL.

use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, SubscriptionId, Timestamp,
};
use crate::domain::webhook::{
    RetryConfig, SubscriptionSecret, WebhookEventType, WebhookSubscription,
};
use crate::ports::SubscriptionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// PostgreSQL implementation of the SubscriptionRepository port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
/// Every query that reads or mutates a subscription is scoped by
/// organization so one tenant can never touch another tenant's rows.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a webhook subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    organization_id: String,
    url: String,
    events: Vec<String>,
    secret: String,
    active: bool,
    headers: Option<serde_json::Value>,
    max_retries: i64,
    retry_delay_ms: i64,
    failure_count: i32,
    last_success_at: Option<DateTime<Utc>>,
    last_triggered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for WebhookSubscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let events = parse_event_types(&row.events)?;
        let headers = parse_headers(row.headers)?;

        Ok(WebhookSubscription {
            id: SubscriptionId::from_uuid(row.id),
            organization_id: OrganizationId::new(row.organization_id).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid organization_id: {}", e),
                )
            })?,
            url: row.url,
            events,
            secret: SubscriptionSecret::new(row.secret),
            active: row.active,
            headers,
            retry_config: RetryConfig {
                max_retries: u32::try_from(row.max_retries)
                    .map_err(|_| invalid_column("max_retries"))?,
                retry_delay_ms: u64::try_from(row.retry_delay_ms)
                    .map_err(|_| invalid_column("retry_delay_ms"))?,
            },
            failure_count: u32::try_from(row.failure_count)
                .map_err(|_| invalid_column("failure_count"))?,
            last_success_at: row.last_success_at.map(Timestamp::from_datetime),
            last_triggered_at: row.last_triggered_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_event_types(events: &[String]) -> Result<Vec<WebhookEventType>, DomainError> {
    events
        .iter()
        .map(|s| {
            s.parse::<WebhookEventType>().map_err(|_| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid event type value: {}", s),
                )
            })
        })
        .collect()
}

fn parse_headers(
    value: Option<serde_json::Value>,
) -> Result<Option<HashMap<String, String>>, DomainError> {
    value
        .map(|v| {
            serde_json::from_value(v).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid headers value: {}", e),
                )
            })
        })
        .transpose()
}

fn invalid_column(column: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid value in column {}", column),
    )
}

fn delay_ms_to_i64(ms: u64) -> Result<i64, DomainError> {
    i64::try_from(ms).map_err(|_| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            "retryDelayMs is too large to store",
        )
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, organization_id, url, events, secret, active, headers,
           max_retries, retry_delay_ms, failure_count,
           last_success_at, last_triggered_at, created_at, updated_at
    FROM webhook_subscriptions
"#;

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert(&self, subscription: &WebhookSubscription) -> Result<(), DomainError> {
        let events: Vec<String> = subscription
            .events
            .iter()
            .map(|e| e.as_str().to_string())
            .collect();
        let headers = subscription
            .headers
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::SerializationError,
                    format!("Failed to serialize headers: {}", e),
                )
            })?;
        let retry_delay_ms = delay_ms_to_i64(subscription.retry_config.retry_delay_ms)?;

        sqlx::query(
            r#"
            INSERT INTO webhook_subscriptions (
                id, organization_id, url, events, secret, active, headers,
                max_retries, retry_delay_ms, failure_count,
                last_success_at, last_triggered_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.organization_id.as_str())
        .bind(&subscription.url)
        .bind(&events)
        .bind(subscription.secret.expose())
        .bind(subscription.active)
        .bind(headers)
        .bind(i64::from(subscription.retry_config.max_retries))
        .bind(retry_delay_ms)
        .bind(
            i32::try_from(subscription.failure_count)
                .map_err(|_| invalid_column("failure_count"))?,
        )
        .bind(subscription.last_success_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_triggered_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to save subscription: {}", e),
            )
        })?;

        Ok(())
    }

    async fn delete(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "DELETE FROM webhook_subscriptions WHERE id = $1 AND organization_id = $2",
        )
        .bind(id.as_uuid())
        .bind(organization_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to delete subscription: {}", e),
            )
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<Option<WebhookSubscription>, DomainError> {
        let query = format!("{} WHERE id = $1 AND organization_id = $2", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .bind(organization_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to find subscription: {}", e),
                )
            })?;

        row.map(WebhookSubscription::try_from).transpose()
    }

    async fn find_active_for(
        &self,
        event_type: WebhookEventType,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        let query = format!(
            "{} WHERE organization_id = $1 AND active = TRUE AND $2 = ANY(events)",
            SELECT_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&query)
            .bind(organization_id.as_str())
            .bind(event_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to find active subscriptions: {}", e),
                )
            })?;

        rows.into_iter().map(WebhookSubscription::try_from).collect()
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        let query = format!(
            "{} WHERE organization_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&query)
            .bind(organization_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to list subscriptions: {}", e),
                )
            })?;

        rows.into_iter().map(WebhookSubscription::try_from).collect()
    }

    async fn record_outcome(&self, id: SubscriptionId, success: bool) -> Result<(), DomainError> {
        let now = Utc::now();

        // A subscription deleted mid-delivery is not an error, so the
        // rows_affected count is intentionally not checked. The failure
        // counter is incremented in the database rather than read back
        // and rewritten, which keeps concurrent dispatches accurate.
        let query = if success {
            r#"
            UPDATE webhook_subscriptions SET
                failure_count = 0,
                last_success_at = $2,
                last_triggered_at = $2,
                updated_at = $2
            WHERE id = $1
            "#
        } else {
            r#"
            UPDATE webhook_subscriptions SET
                failure_count = failure_count + 1,
                last_triggered_at = $2,
                updated_at = $2
            WHERE id = $1
            "#
        };

        sqlx::query(query)
            .bind(id.as_uuid())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to record delivery outcome: {}", e),
                )
            })?;

        Ok(())
    }
}
