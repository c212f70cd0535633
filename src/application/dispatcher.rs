//! WebhookDispatcher - Concurrent fan-out of one event to all subscribers.
//!
//! For each dispatched event the dispatcher:
//! 1. Queries active subscriptions for the event type (tenant-scoped)
//! 2. Spawns one delivery task per subscription
//! 3. Waits for every task to settle (success, failure, or panic)
//! 4. Records per-subscription health counters
//! 5. Appends a single audit entry covering all results
//!
//! Failures in steps 4 and 5 are logged and never fail the dispatch; the
//! delivery results themselves are the authoritative outcome.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::webhook::{DeliveryLogEntry, DeliveryResult, WebhookEvent};
use crate::ports::{DeliveryLogRepository, SubscriptionRepository};

use super::DeliveryEngine;

/// Fans one event out to every matching subscription concurrently.
pub struct WebhookDispatcher {
    subscriptions: Arc<dyn SubscriptionRepository>,
    delivery_log: Arc<dyn DeliveryLogRepository>,
    engine: Arc<DeliveryEngine>,
    shutdown: watch::Receiver<bool>,
}

impl WebhookDispatcher {
    /// Creates a new dispatcher.
    ///
    /// The shutdown receiver is cloned into every delivery task so that
    /// in-flight deliveries resolve promptly when the process stops.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        delivery_log: Arc<dyn DeliveryLogRepository>,
        engine: Arc<DeliveryEngine>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            subscriptions,
            delivery_log,
            engine,
            shutdown,
        }
    }

    /// Dispatches `event` to all active subscriptions of its organization.
    ///
    /// Returns one `DeliveryResult` per matching subscription, in the order
    /// the subscriptions were returned by the registry query. An event with
    /// no matching subscriptions is a no-op and produces no log entry.
    pub async fn dispatch(&self, event: &WebhookEvent) -> Result<Vec<DeliveryResult>, DomainError> {
        let subscriptions = self
            .subscriptions
            .find_active_for(event.event_type, &event.organization_id)
            .await?;

        if subscriptions.is_empty() {
            tracing::debug!(
                event_type = %event.event_type,
                organization_id = %event.organization_id,
                "No active webhook subscriptions for event"
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            subscription_count = subscriptions.len(),
            "Dispatching webhook event"
        );

        let order: Vec<SubscriptionId> = subscriptions.iter().map(|s| s.id).collect();
        let mut join_set = tokio::task::JoinSet::new();

        for (index, subscription) in subscriptions.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let event = event.clone();
            let shutdown = self.shutdown.clone();
            join_set.spawn(async move {
                let result = engine.deliver(&subscription, &event, shutdown).await;
                (index, result)
            });
        }

        // Settle every task. A panicked task leaves its slot empty and is
        // converted into a failed result below.
        let mut slots: Vec<Option<DeliveryResult>> = vec![None; order.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Delivery task panicked"),
            }
        }

        let results: Vec<DeliveryResult> = slots
            .into_iter()
            .zip(order)
            .map(|(slot, subscription_id)| {
                slot.unwrap_or_else(|| {
                    DeliveryResult::failed(subscription_id, None, "delivery task panicked", 0)
                })
            })
            .collect();

        for result in &results {
            if let Err(e) = self
                .subscriptions
                .record_outcome(result.subscription_id, result.success)
                .await
            {
                tracing::error!(
                    error = %e,
                    subscription_id = %result.subscription_id,
                    "Failed to record delivery outcome"
                );
            }
        }

        let entry = DeliveryLogEntry::new(event, results.clone());
        if let Err(e) = self.delivery_log.append(&entry).await {
            tracing::error!(
                error = %e,
                event_id = %event.id,
                "Failed to append delivery log entry"
            );
        }

        let delivered = results.iter().filter(|r| r.success).count();
        tracing::info!(
            event_id = %event.id,
            delivered,
            failed = results.len() - delivered,
            "Webhook dispatch complete"
        );

        Ok(results)
    }
}
