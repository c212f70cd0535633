//! SubscriptionRepository port - Interface for the webhook subscription store.
//!
//! Backs the registry's CRUD operations and the dispatcher's matching query
//! and health bookkeeping. Implementations must keep `record_outcome`'s
//! failure increment atomic in the store itself: concurrent dispatches for
//! different events may target the same subscription, and a caller-side
//! read-modify-write would lose updates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganizationId, SubscriptionId};
use crate::domain::webhook::{WebhookEventType, WebhookSubscription};

/// Port for storing and querying webhook subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persists a new subscription.
    async fn insert(&self, subscription: &WebhookSubscription) -> Result<(), DomainError>;

    /// Deletes a subscription, scoped to its owning tenant.
    ///
    /// Returns `false` when no row matched both the id and the
    /// organization - callers cannot distinguish "not found" from
    /// "owned by someone else", which is the point.
    async fn delete(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<bool, DomainError>;

    /// Finds a subscription by id, scoped to its owning tenant.
    async fn find_by_id(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<Option<WebhookSubscription>, DomainError>;

    /// All active subscriptions of a tenant whose event set contains
    /// `event_type`.
    async fn find_active_for(
        &self,
        event_type: WebhookEventType,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError>;

    /// All subscriptions of a tenant, newest first.
    async fn list(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError>;

    /// Records a delivery outcome on the subscription's health counters.
    ///
    /// Success resets `failure_count` to zero and stamps `last_success_at`;
    /// failure increments `failure_count` atomically in the store. Both
    /// stamp `last_triggered_at`.
    async fn record_outcome(&self, id: SubscriptionId, success: bool) -> Result<(), DomainError>;
}
