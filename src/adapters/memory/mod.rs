//! In-memory repository implementations for testing.
//!
//! Deterministic, lock-based stores used by unit and integration tests.
//!
//! # Security Note
//!
//! These adapters are for **testing only** and should not be used in
//! production. They use `.expect()` on lock operations which will panic if
//! locks are poisoned. Production code uses the Postgres adapters.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, OrganizationId, SubscriptionId, Timestamp};
use crate::domain::webhook::{DeliveryLogEntry, WebhookEventType, WebhookSubscription};
use crate::ports::{DeliveryLogRepository, SubscriptionRepository};

/// In-memory subscription store for testing.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
}

impl InMemorySubscriptionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Returns a subscription by id without tenant scoping (for assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get(&self, id: SubscriptionId) -> Option<WebhookSubscription> {
        self.subscriptions
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Returns the number of stored subscriptions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .len()
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn insert(&self, subscription: &WebhookSubscription) -> Result<(), DomainError> {
        self.subscriptions
            .write()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .push(subscription.clone());
        Ok(())
    }

    async fn delete(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("InMemorySubscriptionStore: lock poisoned");
        let before = subscriptions.len();
        subscriptions.retain(|s| !(s.id == id && &s.organization_id == organization_id));
        Ok(subscriptions.len() < before)
    }

    async fn find_by_id(
        &self,
        id: SubscriptionId,
        organization_id: &OrganizationId,
    ) -> Result<Option<WebhookSubscription>, DomainError> {
        let subscriptions = self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned");
        Ok(subscriptions
            .iter()
            .find(|s| s.id == id && &s.organization_id == organization_id)
            .cloned())
    }

    async fn find_active_for(
        &self,
        event_type: WebhookEventType,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        let subscriptions = self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned");
        Ok(subscriptions
            .iter()
            .filter(|s| {
                s.active && &s.organization_id == organization_id && s.subscribes_to(event_type)
            })
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<WebhookSubscription>, DomainError> {
        let subscriptions = self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned");
        Ok(subscriptions
            .iter()
            .rev()
            .filter(|s| &s.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn record_outcome(&self, id: SubscriptionId, success: bool) -> Result<(), DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("InMemorySubscriptionStore: lock poisoned");
        // A subscription deleted mid-flight is not an error.
        if let Some(subscription) = subscriptions.iter_mut().find(|s| s.id == id) {
            let now = Timestamp::now();
            if success {
                subscription.failure_count = 0;
                subscription.last_success_at = Some(now);
            } else {
                subscription.failure_count += 1;
            }
            subscription.last_triggered_at = Some(now);
            subscription.updated_at = now;
        }
        Ok(())
    }
}

/// In-memory delivery log for testing.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryDeliveryLog {
    entries: RwLock<Vec<DeliveryLogEntry>>,
}

impl InMemoryDeliveryLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Returns all appended entries (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn entries(&self) -> Vec<DeliveryLogEntry> {
        self.entries
            .read()
            .expect("InMemoryDeliveryLog: lock poisoned")
            .clone()
    }

    /// Returns the number of appended entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn entry_count(&self) -> usize {
        self.entries
            .read()
            .expect("InMemoryDeliveryLog: lock poisoned")
            .len()
    }

    /// Clears all entries (for test isolation).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("InMemoryDeliveryLog: lock poisoned")
            .clear();
    }
}

impl Default for InMemoryDeliveryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryLogRepository for InMemoryDeliveryLog {
    async fn append(&self, entry: &DeliveryLogEntry) -> Result<(), DomainError> {
        self.entries
            .write()
            .expect("InMemoryDeliveryLog: lock poisoned")
            .push(entry.clone());
        Ok(())
    }
}
