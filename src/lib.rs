//! FisioFlow Webhooks - Outbound webhook delivery service
//!
//! This crate implements subscription management, signed event delivery with
//! bounded retries, and per-event audit logging for the FisioFlow platform.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
