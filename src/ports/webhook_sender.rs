//! WebhookSender port - HTTP egress for delivery attempts.
//!
//! The delivery engine prepares the full request (signed body, headers) and
//! hands it to this port one attempt at a time. The sender reports either
//! the HTTP status it observed or a transport-level failure; it never
//! interprets status codes - classification belongs to the engine.

use async_trait::async_trait;
use thiserror::Error;

/// A prepared HTTP POST for one delivery attempt.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub url: String,

    /// Header name/value pairs in insertion order. The engine guarantees
    /// reserved delivery headers appear after any subscriber-supplied ones.
    pub headers: Vec<(String, String)>,

    /// Serialized event payload - the exact bytes that were signed.
    pub body: Vec<u8>,
}

/// Summary of a completed HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderResponse {
    pub status: u16,
}

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Clone, Error)]
pub enum SenderError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Port for performing one delivery attempt over HTTP.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// POSTs the request to its URL, bounded by the configured per-attempt
    /// timeout.
    async fn send(&self, request: &WebhookRequest) -> Result<SenderResponse, SenderError>;
}
