//! # Generic Client
//!
//! The typed handle for talking to a [`ResourceActor`](super::ResourceActor). Every call is
//! bounded by the client's request timeout so a wedged or overloaded actor surfaces as
//! [`FrameworkError::Timeout`] instead of blocking the caller forever.

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::{Predicate, ResourceRequest};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Default bound on a single request/response round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A type-safe client for interacting with a `ResourceActor`.
///
/// Holds only a sender and a timeout, so cloning is cheap and clones can be shared across
/// tasks.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    timeout: Duration,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            timeout: self.timeout,
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self {
            sender,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Returns a client that gives up after `timeout` instead of the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn call<R>(
        &self,
        request: ResourceRequest<T>,
        response: oneshot::Receiver<Result<R, FrameworkError>>,
    ) -> Result<R, FrameworkError> {
        let round_trip = async {
            self.sender
                .send(request)
                .await
                .map_err(|_| FrameworkError::ActorClosed)?;
            response.await.map_err(|_| FrameworkError::ActorDropped)?
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| FrameworkError::Timeout(self.timeout))?
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Create { params, respond_to }, response)
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Get { id, respond_to }, response)
            .await
    }

    /// Exact lookup through the entity's unique key.
    pub async fn get_by_key(&self, key: String) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::GetByKey { key, respond_to }, response)
            .await
    }

    /// All entities, or those matching `filter`. Order is unspecified.
    pub async fn list(&self, filter: Option<Predicate<T>>) -> Result<Vec<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::List { filter, respond_to }, response)
            .await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(
            ResourceRequest::Update {
                id,
                update,
                respond_to,
            },
            response,
        )
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Delete { id, respond_to }, response)
            .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(
            ResourceRequest::Action {
                id,
                action,
                respond_to,
            },
            response,
        )
        .await
    }
}
