//! Outbound HTTP sender backed by reqwest.
//!
//! Performs a single POST per call. Retry scheduling lives in the
//! application layer, not here. Redirects are never followed: the signed
//! body and delivery headers must not be replayed to a target the
//! subscriber did not register, so a 3xx is reported as-is.

use crate::ports::{SenderError, SenderResponse, WebhookRequest, WebhookSender};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reqwest implementation of the WebhookSender port.
pub struct ReqwestWebhookSender {
    client: Client,
}

impl ReqwestWebhookSender {
    /// Creates a new sender with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl WebhookSender for ReqwestWebhookSender {
    async fn send(&self, request: &WebhookRequest) -> Result<SenderResponse, SenderError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SenderError::Timeout
                } else if e.is_connect() {
                    SenderError::Connect(e.to_string())
                } else {
                    SenderError::Request(e.to_string())
                }
            })?;

        Ok(SenderResponse {
            status: response.status().as_u16(),
        })
    }
}
