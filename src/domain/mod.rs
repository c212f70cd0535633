//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `webhook` - Events, subscriptions, signatures, and delivery outcomes

pub mod foundation;
pub mod webhook;
