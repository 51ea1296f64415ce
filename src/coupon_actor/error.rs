//! Error types for the Coupon actor.

use crate::framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during coupon operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CouponError {
    /// No active coupon with this code belongs to the user.
    #[error("Coupon not found: {0}")]
    NotFound(String),

    /// The coupon exists but is past its expiry date. It has been deactivated.
    #[error("Coupon has expired: {0}")]
    Expired(String),

    /// The coupon payload is invalid.
    #[error("Coupon validation error: {0}")]
    ValidationError(String),

    /// Could not find a free code after several attempts.
    #[error("Coupon code collision: {0}")]
    CodeCollision(String),

    /// The coupon actor did not answer (closed, dropped or timed out).
    #[error("Coupon store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure communicating with the actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for CouponError {
    fn from(e: FrameworkError) -> Self {
        match e.downcast::<CouponError>() {
            Ok(own) => own,
            Err(FrameworkError::Conflict(code)) => CouponError::CodeCollision(code),
            Err(FrameworkError::NotFound(id)) => CouponError::NotFound(id),
            Err(e) if e.is_unavailable() => CouponError::Unavailable(e.to_string()),
            Err(e) => CouponError::ActorCommunicationError(e.to_string()),
        }
    }
}
