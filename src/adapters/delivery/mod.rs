//! Delivery adapters - Outbound HTTP transport for webhook requests.

mod reqwest_sender;

pub use reqwest_sender::ReqwestWebhookSender;
