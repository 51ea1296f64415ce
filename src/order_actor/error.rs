//! Error types for the Order actor.

use crate::framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// Another order already carries this external session id.
    #[error("Duplicate session: {0}")]
    DuplicateSession(String),

    /// A conditional update found the order in a different state than expected.
    #[error("Order changed concurrently: {0}")]
    StaleState(String),

    /// The order actor did not answer (closed, dropped or timed out).
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure communicating with the actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e.downcast::<OrderError>() {
            Ok(own) => own,
            Err(FrameworkError::Conflict(session)) => OrderError::DuplicateSession(session),
            Err(FrameworkError::NotFound(id)) => OrderError::NotFound(id),
            Err(e) if e.is_unavailable() => OrderError::Unavailable(e.to_string()),
            Err(e) => OrderError::ActorCommunicationError(e.to_string()),
        }
    }
}
