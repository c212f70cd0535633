//! DeliveryEngine - Signed delivery of one event to one subscriber.
//!
//! Runs the bounded retry loop for a single (subscription, event) pair:
//! serialize, sign, POST, classify the response, back off, repeat. Fan-out
//! across subscriptions belongs to the dispatcher; the engine never talks
//! to storage.
//!
//! ## Retry Schedule
//!
//! | After failed attempt | Delay before next attempt |
//! |----------------------|---------------------------|
//! | 0                    | `retry_delay_ms`          |
//! | 1                    | `retry_delay_ms * 2`      |
//! | 2                    | `retry_delay_ms * 4`      |
//!
//! Only 5xx, 429, and transport failures are retried. Any other non-2xx
//! status stops the loop immediately.
//!
//! ## Graceful Shutdown
//!
//! Each attempt and each backoff sleep is raced against a shutdown signal;
//! a cancelled delivery resolves to a failed result instead of hanging.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DeliveryId;
use crate::domain::webhook::signature::{self, SIGNATURE_PREFIX};
use crate::domain::webhook::{AttemptOutcome, DeliveryResult, WebhookEvent, WebhookSubscription};
use crate::ports::{WebhookRequest, WebhookSender};

/// User-Agent sent with every outbound webhook request.
const USER_AGENT: &str = "FisioFlow-Webhooks/1.0";

/// Header names owned by the delivery engine. Subscriber-configured static
/// headers with these names (any casing) are dropped, never merged.
const RESERVED_HEADERS: [&str; 5] = [
    "content-type",
    "x-fisioflow-signature",
    "x-fisioflow-event",
    "x-fisioflow-delivery-id",
    "user-agent",
];

/// Delivers a single event to a single subscriber with bounded retries.
///
/// The engine is stateless; one instance is shared by every delivery task.
pub struct DeliveryEngine {
    sender: Arc<dyn WebhookSender>,
}

impl DeliveryEngine {
    /// Creates a new engine over the given outbound sender.
    pub fn new(sender: Arc<dyn WebhookSender>) -> Self {
        Self { sender }
    }

    /// Delivers `event` to `subscription`, returning the final result.
    ///
    /// This method never fails: every error becomes a failed
    /// `DeliveryResult`. Intermediate attempts surface only as tracing
    /// events; the result reflects the last attempt.
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        event: &WebhookEvent,
        mut shutdown: watch::Receiver<bool>,
    ) -> DeliveryResult {
        let started = Instant::now();
        let delivery_id = DeliveryId::new();

        let body = match serde_json::to_vec(event) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    subscription_id = %subscription.id,
                    event_id = %event.id,
                    error = %e,
                    "Failed to serialize webhook event"
                );
                return DeliveryResult::failed(
                    subscription.id,
                    None,
                    format!("Failed to serialize event: {}", e),
                    elapsed_ms(started),
                );
            }
        };

        let signature_hex = signature::sign(&body, subscription.secret.expose());
        let request = WebhookRequest {
            url: subscription.url.clone(),
            headers: build_headers(subscription, event, delivery_id, &signature_hex),
            body,
        };

        let max_retries = subscription.retry_config.max_retries;
        let mut last_status: Option<u16> = None;
        let mut last_error: Option<String> = None;

        for attempt in 0..=max_retries {
            let outcome = tokio::select! {
                outcome = self.attempt(&request) => outcome,
                _ = shutdown_requested(&mut shutdown) => {
                    return self.cancelled(subscription, delivery_id, last_status, started);
                }
            };

            match outcome {
                AttemptOutcome::Success { status } => {
                    tracing::info!(
                        subscription_id = %subscription.id,
                        delivery_id = %delivery_id,
                        status,
                        attempt,
                        "Webhook delivered"
                    );
                    return DeliveryResult::succeeded(subscription.id, status, elapsed_ms(started));
                }
                AttemptOutcome::TerminalFailure { status, error } => {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        delivery_id = %delivery_id,
                        status,
                        "Webhook rejected with non-retryable status"
                    );
                    last_status = Some(status);
                    last_error = Some(error);
                    break;
                }
                AttemptOutcome::RetryableFailure { status, error } => {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        delivery_id = %delivery_id,
                        attempt,
                        error = %error,
                        "Webhook delivery attempt failed"
                    );
                    if let Some(status) = status {
                        last_status = Some(status);
                    }
                    last_error = Some(error);

                    if attempt < max_retries {
                        let delay =
                            backoff_delay(subscription.retry_config.retry_delay_ms, attempt);
                        tokio::select! {
                            _ = time::sleep(delay) => {}
                            _ = shutdown_requested(&mut shutdown) => {
                                return self
                                    .cancelled(subscription, delivery_id, last_status, started);
                            }
                        }
                    }
                }
            }
        }

        DeliveryResult::failed(
            subscription.id,
            last_status,
            last_error.unwrap_or_else(|| "Unknown error".to_string()),
            elapsed_ms(started),
        )
    }

    /// Performs one HTTP attempt and classifies its outcome.
    async fn attempt(&self, request: &WebhookRequest) -> AttemptOutcome {
        match self.sender.send(request).await {
            Ok(response) => AttemptOutcome::from_status(response.status),
            Err(e) => AttemptOutcome::from_transport_error(e.to_string()),
        }
    }

    fn cancelled(
        &self,
        subscription: &WebhookSubscription,
        delivery_id: DeliveryId,
        last_status: Option<u16>,
        started: Instant,
    ) -> DeliveryResult {
        tracing::warn!(
            subscription_id = %subscription.id,
            delivery_id = %delivery_id,
            "Delivery cancelled by shutdown"
        );
        DeliveryResult::failed(
            subscription.id,
            last_status,
            "delivery cancelled by shutdown",
            elapsed_ms(started),
        )
    }
}

/// Builds the outbound header list: subscriber static headers first (with
/// reserved names filtered out), then the reserved delivery headers.
fn build_headers(
    subscription: &WebhookSubscription,
    event: &WebhookEvent,
    delivery_id: DeliveryId,
    signature_hex: &str,
) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();

    if let Some(custom) = &subscription.headers {
        for (name, value) in custom {
            if is_reserved_header(name) {
                tracing::debug!(
                    subscription_id = %subscription.id,
                    header = %name,
                    "Ignoring subscriber override of reserved header"
                );
                continue;
            }
            headers.push((name.clone(), value.clone()));
        }
    }

    headers.push((
        "Content-Type".to_string(),
        "application/json".to_string(),
    ));
    headers.push((
        "X-FisioFlow-Signature".to_string(),
        format!("{}{}", SIGNATURE_PREFIX, signature_hex),
    ));
    headers.push((
        "X-FisioFlow-Event".to_string(),
        event.event_type.as_str().to_string(),
    ));
    headers.push((
        "X-FisioFlow-Delivery-Id".to_string(),
        delivery_id.to_string(),
    ));
    headers.push(("User-Agent".to_string(), USER_AGENT.to_string()));

    headers
}

fn is_reserved_header(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
}

/// Exponential backoff without jitter: `retry_delay_ms * 2^attempt`.
fn backoff_delay(retry_delay_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(retry_delay_ms.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Resolves when shutdown is signalled. If the sender side is gone without
/// ever signalling, shutdown can no longer be requested and this future
/// stays pending.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
