//! Generic resource-actor framework.
//!
//! Each resource type (products, orders, coupons) is owned by exactly one
//! [`ResourceActor`] running in its own Tokio task. The actor is the only writer of its
//! collection and handles one request at a time, which is what makes the stock check in a
//! reservation and the unique-session check in an order insert atomic.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - trait resource types implement to be managed by an actor
//! - [`ResourceActor`] - the server half, owning the collection and a unique-key index
//! - [`ResourceClient`] - the cloneable, timeout-bounded client half
//! - [`ActorClient`] - default `get`/`delete` for resource-specific client wrappers
//! - [`FrameworkError`] - plumbing failures plus the boxed entity error
//!
//! See [`mock`] for utilities to test clients without spawning actors.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::{ResourceClient, DEFAULT_REQUEST_TIMEOUT};
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{Predicate, ResourceRequest, Response};
