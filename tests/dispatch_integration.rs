//! Integration tests for the webhook delivery pipeline.
//!
//! These tests exercise the full flow:
//! 1. A subscription is registered through the `SubscriptionRegistry`.
//! 2. A domain event is dispatched through the `WebhookDispatcher`.
//! 3. The `DeliveryEngine` signs the payload and POSTs it, retrying
//!    retryable failures with exponential backoff.
//! 4. Outcomes land in the subscription health counters and as a single
//!    entry in the delivery log.
//!
//! The HTTP egress is replaced with a scripted sender so every network
//! outcome (2xx, 4xx, 5xx, transport failure, hang) is deterministic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;

use fisioflow_webhooks::adapters::{InMemoryDeliveryLog, InMemorySubscriptionStore};
use fisioflow_webhooks::application::{DeliveryEngine, SubscriptionRegistry, WebhookDispatcher};
use fisioflow_webhooks::domain::foundation::{OrganizationId, UserId};
use fisioflow_webhooks::domain::webhook::{
    signature, NewSubscription, RetryConfig, WebhookEvent, WebhookEventType,
};
use fisioflow_webhooks::ports::{SenderError, SenderResponse, WebhookRequest, WebhookSender};

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Webhook sender that replays a scripted queue of responses per URL and
/// records every request it receives.
///
/// Requests to a URL with no remaining scripted response fail with a
/// connect error, so a delivery that attempts more often than a test
/// scripted for is visible in both the request count and the result.
struct ScriptedSender {
    responses: Mutex<HashMap<String, VecDeque<Result<SenderResponse, SenderError>>>>,
    requests: Mutex<Vec<WebhookRequest>>,
}

impl ScriptedSender {
    fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Appends scripted responses for a URL, consumed one per attempt.
    fn script(&self, url: &str, responses: Vec<Result<SenderResponse, SenderError>>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(responses);
    }

    fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn requests_to(&self, url: &str) -> Vec<WebhookRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WebhookSender for ScriptedSender {
    async fn send(&self, request: &WebhookRequest) -> Result<SenderResponse, SenderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .get_mut(&request.url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(SenderError::Connect("unscripted request".to_string())))
    }
}

/// Webhook sender whose requests never complete, for shutdown tests.
struct PendingSender;

#[async_trait]
impl WebhookSender for PendingSender {
    async fn send(&self, _request: &WebhookRequest) -> Result<SenderResponse, SenderError> {
        std::future::pending().await
    }
}

fn http(status: u16) -> Result<SenderResponse, SenderError> {
    Ok(SenderResponse { status })
}

fn org(id: &str) -> OrganizationId {
    OrganizationId::new(id).unwrap()
}

/// A registration request with a fast retry policy so retrying tests
/// finish quickly: up to 3 retries, 10ms base delay.
fn new_subscription(
    organization: &str,
    url: &str,
    events: Vec<WebhookEventType>,
) -> NewSubscription {
    NewSubscription {
        organization_id: org(organization),
        url: url.to_string(),
        events,
        secret: None,
        active: None,
        headers: None,
        retry_config: Some(RetryConfig {
            max_retries: 3,
            retry_delay_ms: 10,
        }),
    }
}

fn patient_event(organization: &str) -> WebhookEvent {
    WebhookEvent::new(
        WebhookEventType::PatientCreated,
        json!({"patient": {"id": "p-100", "name": "Ana Souza"}}),
        org(organization),
        None,
    )
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A registered endpoint receives the event exactly as serialized, signed
/// with the secret generated at registration, and the outcome is recorded
/// in both the health counters and the delivery log.
#[tokio::test]
async fn subscribed_endpoint_receives_a_signed_event() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/patients";
    sender.script(url, vec![http(200)]);

    let created = registry
        .subscribe(new_subscription(
            "org-1",
            url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let event = WebhookEvent::new(
        WebhookEventType::PatientCreated,
        json!({"patient": {"id": "p-100", "name": "Ana Souza"}}),
        org("org-1"),
        Some(UserId::new("user-7").unwrap()),
    );
    let results = dispatcher.dispatch(&event).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].status_code, Some(200));
    assert_eq!(results[0].subscription_id, created.id);

    let requests = sender.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, url);

    // The body is the serialized event envelope with wire field names.
    assert_eq!(requests[0].body, serde_json::to_vec(&event).unwrap());
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["type"], "patient.created");
    assert_eq!(body["organizationId"], "org-1");
    assert_eq!(body["userId"], "user-7");
    assert_eq!(body["data"]["patient"]["id"], "p-100");

    // The signature header verifies against the generated secret.
    let signature_header = requests[0]
        .headers
        .iter()
        .find(|(name, _)| name == "X-FisioFlow-Signature")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert!(signature::verify(
        &requests[0].body,
        &signature_header,
        created.secret.expose(),
    ));

    let event_header = requests[0]
        .headers
        .iter()
        .find(|(name, _)| name == "X-FisioFlow-Event")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert_eq!(event_header, "patient.created");

    let stored = store.get(created.id).unwrap();
    assert_eq!(stored.failure_count, 0);
    assert!(stored.last_success_at.is_some());
    assert!(stored.last_triggered_at.is_some());

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_id, event.id);
    assert_eq!(entries[0].event_type, WebhookEventType::PatientCreated);
    assert_eq!(entries[0].results.len(), 1);
    assert!(entries[0].results[0].success);
}

/// A secret supplied at registration is used for signing instead of a
/// generated one.
#[tokio::test]
async fn caller_supplied_secrets_are_used_for_signing() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/signed";
    sender.script(url, vec![http(204)]);

    let mut request = new_subscription("org-1", url, vec![WebhookEventType::PaymentReceived]);
    request.secret = Some("a-shared-secret-value".to_string());
    registry.subscribe(request).await.unwrap();

    let event = WebhookEvent::new(
        WebhookEventType::PaymentReceived,
        json!({"payment": {"id": "pay-1", "amount": 150.0}}),
        org("org-1"),
        None,
    );
    let results = dispatcher.dispatch(&event).await.unwrap();

    assert!(results[0].success);
    assert_eq!(results[0].status_code, Some(204));

    let requests = sender.requests();
    let signature_header = requests[0]
        .headers
        .iter()
        .find(|(name, _)| name == "X-FisioFlow-Signature")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert!(signature::verify(
        &requests[0].body,
        &signature_header,
        "a-shared-secret-value",
    ));
}

/// Retryable failures are retried until the subscription's budget is
/// exhausted: max_retries 3 means exactly 4 attempts, after which the
/// delivery fails with the last observed status.
#[tokio::test]
async fn retries_exhaust_the_subscription_budget() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/unstable";
    sender.script(url, vec![http(503); 4]);

    let created = registry
        .subscribe(new_subscription(
            "org-1",
            url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert_eq!(sender.requests_to(url).len(), 4);
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].status_code, Some(503));
    assert_eq!(
        results[0].error.as_deref(),
        Some("HTTP 503: Service Unavailable")
    );

    let stored = store.get(created.id).unwrap();
    assert_eq!(stored.failure_count, 1);
    assert!(stored.last_success_at.is_none());

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].results[0].success);
}

/// Non-retryable rejections (4xx other than 429) stop after a single
/// attempt no matter how much retry budget remains.
#[tokio::test]
async fn terminal_rejections_are_not_retried() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/rejects";
    sender.script(url, vec![http(400)]);

    let created = registry
        .subscribe(new_subscription(
            "org-1",
            url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert_eq!(sender.requests_to(url).len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].status_code, Some(400));
    assert_eq!(store.get(created.id).unwrap().failure_count, 1);
}

/// One subscriber exhausting its retries never blocks or fails the others;
/// both outcomes land in a single delivery log entry.
#[tokio::test]
async fn one_failing_subscriber_does_not_block_the_rest() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let failing_url = "https://hooks.example.com/broken";
    let healthy_url = "https://hooks.example.com/healthy";
    sender.script(failing_url, vec![http(500); 4]);
    sender.script(healthy_url, vec![http(200)]);

    let failing = registry
        .subscribe(new_subscription(
            "org-1",
            failing_url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();
    let healthy = registry
        .subscribe(new_subscription(
            "org-1",
            healthy_url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert_eq!(results.len(), 2);
    let failing_result = results
        .iter()
        .find(|r| r.subscription_id == failing.id)
        .unwrap();
    let healthy_result = results
        .iter()
        .find(|r| r.subscription_id == healthy.id)
        .unwrap();
    assert!(!failing_result.success);
    assert!(healthy_result.success);

    assert_eq!(store.get(failing.id).unwrap().failure_count, 1);
    assert_eq!(store.get(healthy.id).unwrap().failure_count, 0);

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].results.len(), 2);
}

/// Dispatching an event nobody subscribes to performs no HTTP work and
/// writes no delivery log entry.
#[tokio::test]
async fn dispatch_with_no_matching_subscribers_is_a_no_op() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    registry
        .subscribe(new_subscription(
            "org-1",
            "https://hooks.example.com/payments",
            vec![WebhookEventType::PaymentReceived],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert!(results.is_empty());
    assert!(sender.requests().is_empty());
    assert_eq!(log.entry_count(), 0);
}

/// Inactive subscriptions are skipped entirely.
#[tokio::test]
async fn inactive_subscriptions_are_not_delivered_to() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let mut request = new_subscription(
        "org-1",
        "https://hooks.example.com/paused",
        vec![WebhookEventType::PatientCreated],
    );
    request.active = Some(false);
    registry.subscribe(request).await.unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert!(results.is_empty());
    assert!(sender.requests().is_empty());
    assert_eq!(log.entry_count(), 0);
}

/// Events only reach subscriptions in their own organization.
#[tokio::test]
async fn dispatch_is_scoped_to_the_event_organization() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let own_url = "https://hooks.example.com/clinic-a";
    let foreign_url = "https://hooks.example.com/clinic-b";
    sender.script(own_url, vec![http(200)]);

    registry
        .subscribe(new_subscription(
            "org-a",
            own_url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();
    registry
        .subscribe(new_subscription(
            "org-b",
            foreign_url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-a")).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(sender.requests_to(own_url).len(), 1);
    assert!(sender.requests_to(foreign_url).is_empty());
}

/// Unsubscribing is tenant-scoped: a foreign organization cannot remove a
/// subscription it does not own.
#[tokio::test]
async fn unsubscribe_refuses_a_foreign_organization() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let registry = SubscriptionRegistry::new(store.clone());

    let created = registry
        .subscribe(new_subscription(
            "org-a",
            "https://hooks.example.com/owned",
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let foreign = registry.unsubscribe(created.id, &org("org-b")).await.unwrap();
    assert!(!foreign);
    assert_eq!(store.subscription_count(), 1);

    let owned = registry.unsubscribe(created.id, &org("org-a")).await.unwrap();
    assert!(owned);
    assert_eq!(store.subscription_count(), 0);
}

/// A failed dispatch increments the failure counter; the next successful
/// delivery resets it to zero.
#[tokio::test]
async fn a_successful_delivery_resets_the_failure_counter() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/flaky";
    let created = registry
        .subscribe(new_subscription(
            "org-1",
            url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    sender.script(url, vec![http(500); 4]);
    dispatcher.dispatch(&patient_event("org-1")).await.unwrap();
    assert_eq!(store.get(created.id).unwrap().failure_count, 1);

    sender.script(url, vec![http(200)]);
    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert!(results[0].success);
    let stored = store.get(created.id).unwrap();
    assert_eq!(stored.failure_count, 0);
    assert!(stored.last_success_at.is_some());
    assert_eq!(log.entry_count(), 2);
}

/// A transient failure recovered within one delivery still counts as a
/// success: two attempts, one result, no failure recorded.
#[tokio::test]
async fn recovery_within_one_delivery_is_a_success() {
    let sender = Arc::new(ScriptedSender::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(sender.clone()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = WebhookDispatcher::new(store.clone(), log.clone(), engine, shutdown_rx);
    let registry = SubscriptionRegistry::new(store.clone());

    let url = "https://hooks.example.com/recovering";
    sender.script(
        url,
        vec![
            Err(SenderError::Timeout),
            http(200),
        ],
    );

    let created = registry
        .subscribe(new_subscription(
            "org-1",
            url,
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let results = dispatcher.dispatch(&patient_event("org-1")).await.unwrap();

    assert_eq!(sender.requests_to(url).len(), 2);
    assert!(results[0].success);
    assert_eq!(results[0].status_code, Some(200));
    assert_eq!(store.get(created.id).unwrap().failure_count, 0);
}

/// Shutdown cancels deliveries still in flight. The cancellation shows up
/// as a failed result and the event is still logged for the audit trail.
#[tokio::test]
async fn shutdown_cancels_deliveries_in_flight() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let log = Arc::new(InMemoryDeliveryLog::new());
    let engine = Arc::new(DeliveryEngine::new(Arc::new(PendingSender)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = Arc::new(WebhookDispatcher::new(
        store.clone(),
        log.clone(),
        engine,
        shutdown_rx,
    ));
    let registry = SubscriptionRegistry::new(store.clone());

    registry
        .subscribe(new_subscription(
            "org-1",
            "https://hooks.example.com/slow",
            vec![WebhookEventType::PatientCreated],
        ))
        .await
        .unwrap();

    let event = patient_event("org-1");
    let handle = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch(&event).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    let results = handle.await.unwrap().unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(
        results[0].error.as_deref(),
        Some("delivery cancelled by shutdown")
    );
    assert_eq!(log.entry_count(), 1);
}
