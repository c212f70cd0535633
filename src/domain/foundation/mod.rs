//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the FisioFlow webhook domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DeliveryId, EventId, OrganizationId, SubscriptionId, UserId};
pub use timestamp::Timestamp;
