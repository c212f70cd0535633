//! SubscriptionRegistry - Lifecycle management for webhook subscriptions.
//!
//! Validates and persists new subscriptions, generates secrets when the
//! caller does not supply one, and answers tenant-scoped queries. All
//! operations require the caller's organization; there is no cross-tenant
//! access path.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrganizationId, SubscriptionId, Timestamp};
use crate::domain::webhook::{
    NewSubscription, SubscriptionSecret, WebhookEventType, WebhookSubscription,
};
use crate::ports::SubscriptionRepository;

/// Application service for creating, removing, and querying subscriptions.
pub struct SubscriptionRegistry {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionRegistry {
    /// Creates a new registry over the given repository.
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// Registers a new subscription.
    ///
    /// When no secret is supplied a random 32-byte secret is generated.
    /// The returned subscription carries the secret; callers decide
    /// whether to expose it (the HTTP layer returns it exactly once, in
    /// the creation response).
    pub async fn subscribe(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<WebhookSubscription, DomainError> {
        // 1. Validate input
        new_subscription.validate()?;

        // 2. Resolve the signing secret
        let secret = match new_subscription.secret {
            Some(secret) => SubscriptionSecret::new(secret),
            None => SubscriptionSecret::generate(),
        };

        // 3. Build the subscription with defaults applied
        let now = Timestamp::now();
        let subscription = WebhookSubscription {
            id: SubscriptionId::new(),
            organization_id: new_subscription.organization_id,
            url: new_subscription.url,
            events: new_subscription.events,
            secret,
            active: new_subscription.active.unwrap_or(true),
            headers: new_subscription.headers,
            retry_config: new_subscription.retry_config.unwrap_or_default(),
            failure_count: 0,
            last_success_at: None,
            last_triggered_at: None,
            created_at: now,
            updated_at: now,
        };

        // 4. Persist
        self.subscriptions.insert(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            organization_id = %subscription.organization_id,
            event_count = subscription.events.len(),
            "Webhook subscription created"
        );

        Ok(subscription)
    }

    /// Removes a subscription owned by the given organization.
    ///
    /// Returns `false` when no such subscription exists for that
    /// organization, including when the id belongs to another tenant.
    pub async fn unsubscribe(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<bool, DomainError> {
        let deleted = self.subscriptions.delete(id, organization_id).await?;

        if deleted {
            tracing::info!(
                subscription_id = %id,
                organization_id = %organization_id,
                "Webhook subscription deleted"
            );
        }

        Ok(deleted)
    }

    /// Looks up a single subscription within the organization.
    pub async fn get(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<Option<WebhookSubscription>, DomainError> {
        self.subscriptions.find_by_id(id, organization_id).await
    }

    /// Lists all of the organization's subscriptions, newest first.
    pub async fn list(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        self.subscriptions.list(organization_id).await
    }

    /// Returns the organization's active subscriptions for one event type.
    pub async fn active_subscriptions_for(
        &self,
        event_type: WebhookEventType,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        self.subscriptions
            .find_active_for(event_type, organization_id)
            .await
    }
}
