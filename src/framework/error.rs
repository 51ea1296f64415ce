//! # Framework Errors
//!
//! Errors raised by the actor plumbing itself. Entity-level failures travel inside
//! [`FrameworkError::EntityError`] and are recovered with [`FrameworkError::downcast`].

/// Errors that can occur within the actor framework.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Actor did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unique key already taken: {0}")]
    Conflict(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Recovers the entity's own error type.
    ///
    /// Returns `Ok(e)` when this is an `EntityError` wrapping an `E`, otherwise hands the
    /// framework error back unchanged so the caller can map it.
    pub fn downcast<E>(self) -> Result<E, FrameworkError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            FrameworkError::EntityError(inner) => match inner.downcast::<E>() {
                Ok(e) => Ok(*e),
                Err(other) => Err(FrameworkError::EntityError(other)),
            },
            other => Err(other),
        }
    }

    /// True for failures of the storage task itself rather than of the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            FrameworkError::ActorClosed | FrameworkError::ActorDropped | FrameworkError::Timeout(_)
        )
    }
}
