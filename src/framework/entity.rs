//! # ActorEntity Trait
//!
//! The contract every stored resource (Product, Order, Coupon) implements so the generic
//! [`ResourceActor`](super::ResourceActor) can own it. Associated types pin down the id,
//! the create/update payloads, the custom actions, the injected context and the error type,
//! so a `ProductCreate` can never be sent to the order store.
//!
//! # Provided Methods
//! - [`ActorEntity::on_create`] and [`ActorEntity::on_delete`] default to `Ok(())`.
//! - [`ActorEntity::unique_key`] defaults to `None`. Entities that return a key get a
//!   unique secondary index inside their actor: a second `Create` carrying the same key is
//!   rejected with [`FrameworkError::Conflict`](super::FrameworkError::Conflict) and the key
//!   can be looked up with [`ResourceClient::get_by_key`](super::ResourceClient::get_by_key).

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// Hooks are async so they may call other actors. The `Context` is handed to `run()`
/// rather than `new()`, which lets actors be wired after they are constructed.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// Identifier for this entity. Built from the actor's sequential counter.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Resource-specific operations (e.g. `Reserve`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// Dependencies injected into the actor. `()` when none are needed.
    type Context: Send + Sync;

    /// One error enum per actor rather than one per message.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload. Called before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Value of the entity's unique secondary key, if it has one.
    fn unique_key(&self) -> Option<String> {
        None
    }

    /// Called after construction and before the entity is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
