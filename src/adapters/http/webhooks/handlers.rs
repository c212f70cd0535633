//! HTTP handlers for webhook management endpoints.
//!
//! These handlers connect Axum routes to the application layer services.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tokio::sync::watch;

use crate::application::{DeliveryEngine, SubscriptionRegistry};
use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::webhook::{NewSubscription, WebhookEvent, WebhookEventType};
use crate::ports::{SubscriptionRepository, WebhookSender};

use super::dto::{
    CreateSubscriptionRequest, ErrorResponse, EventTypesResponse, ListSubscriptionsResponse,
    SubscriptionResponse, TestDeliveryResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct WebhookAppState {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub sender: Arc<dyn WebhookSender>,
    /// Observed by test deliveries so an in-flight retry loop stops on
    /// shutdown instead of blocking it.
    pub shutdown: watch::Receiver<bool>,
}

impl WebhookAppState {
    /// Create application services on demand from the shared state.
    pub fn registry(&self) -> SubscriptionRegistry {
        SubscriptionRegistry::new(self.subscriptions.clone())
    }

    pub fn engine(&self) -> DeliveryEngine {
        DeliveryEngine::new(self.sender.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Organization Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Tenant context extracted from the request.
///
/// In production, this would be derived from the session by auth middleware.
/// For now, uses a header-based extraction for development/testing.
#[derive(Debug, Clone)]
pub struct OrganizationContext {
    pub organization_id: OrganizationId,
}

/// Rejection type for OrganizationContext extraction.
pub struct OrganizationRequired;

impl IntoResponse for OrganizationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new(
            "ORGANIZATION_REQUIRED",
            "X-Organization-Id header is required",
        );
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for OrganizationContext
where
    S: Send + Sync,
{
    type Rejection = OrganizationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let organization_id = parts
                .headers
                .get("X-Organization-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| OrganizationId::new(s).ok())
                .ok_or(OrganizationRequired)?;

            Ok(OrganizationContext { organization_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks - Register a new webhook subscription
pub async fn subscribe(
    State(state): State<WebhookAppState>,
    organization: OrganizationContext,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, WebhookApiError> {
    let registry = state.registry();
    let new_subscription = NewSubscription {
        organization_id: organization.organization_id,
        url: request.url,
        events: request.events,
        secret: request.secret,
        active: request.active,
        headers: request.headers,
        retry_config: request.retry_config,
    };

    let subscription = registry.subscribe(new_subscription).await?;

    // The secret appears in this response and nowhere else.
    let response = SubscriptionResponse::with_secret(&subscription);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/webhooks - List the organization's subscriptions
pub async fn list_subscriptions(
    State(state): State<WebhookAppState>,
    organization: OrganizationContext,
) -> Result<impl IntoResponse, WebhookApiError> {
    let subscriptions = state.registry().list(&organization.organization_id).await?;

    let response = ListSubscriptionsResponse {
        subscriptions: subscriptions
            .iter()
            .map(SubscriptionResponse::redacted)
            .collect(),
    };

    Ok(Json(response))
}

/// DELETE /api/webhooks/:id - Remove a subscription
pub async fn unsubscribe(
    State(state): State<WebhookAppState>,
    organization: OrganizationContext,
    Path(id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, WebhookApiError> {
    let deleted = state
        .registry()
        .unsubscribe(id, &organization.organization_id)
        .await?;

    if !deleted {
        return Err(DomainError::subscription_not_found(id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Delivery Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/:id/test - Deliver a test event to one subscription
///
/// Runs the full delivery pipeline (signing, headers, retries) against the
/// subscription's endpoint and reports the final result synchronously.
pub async fn test_delivery(
    State(state): State<WebhookAppState>,
    organization: OrganizationContext,
    headers: HeaderMap,
    Path(id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, WebhookApiError> {
    let subscription = state
        .registry()
        .get(id, &organization.organization_id)
        .await?
        .ok_or_else(|| DomainError::subscription_not_found(id))?;

    let user_id = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::new(s).ok());

    let event = WebhookEvent::new(
        WebhookEventType::TestEvent,
        json!({
            "test": true,
            "message": "This is a test webhook event from FisioFlow",
            "timestamp": Timestamp::now().as_datetime().to_rfc3339(),
        }),
        organization.organization_id,
        user_id,
    );

    let result = state
        .engine()
        .deliver(&subscription, &event, state.shutdown.clone())
        .await;

    Ok(Json(TestDeliveryResponse::from(result)))
}

/// GET /api/webhooks/event-types - Catalog of subscribable event types
pub async fn event_types() -> impl IntoResponse {
    Json(EventTypesResponse::catalog())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct WebhookApiError(DomainError);

impl From<DomainError> for WebhookApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::SubscriptionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::DatabaseError | ErrorCode::SerializationError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
