//! # Generic Messages
//!
//! Requests sent from a [`ResourceClient`](super::ResourceClient) to a
//! [`ResourceActor`](super::ResourceActor). Variants map to CRUD plus the unique-key lookup,
//! filtered listing and custom actions.

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use std::fmt;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Filter evaluated inside the actor for `List` requests.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Internal message type sent to the actor to request operations.
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    GetByKey {
        key: String,
        respond_to: Response<Option<T>>,
    },
    List {
        filter: Option<Predicate<T>>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

impl<T: ActorEntity> fmt::Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRequest::Create { params, .. } => {
                f.debug_struct("Create").field("params", params).finish()
            }
            ResourceRequest::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            ResourceRequest::GetByKey { key, .. } => {
                f.debug_struct("GetByKey").field("key", key).finish()
            }
            ResourceRequest::List { filter, .. } => f
                .debug_struct("List")
                .field("filtered", &filter.is_some())
                .finish(),
            ResourceRequest::Update { id, update, .. } => f
                .debug_struct("Update")
                .field("id", id)
                .field("update", update)
                .finish(),
            ResourceRequest::Delete { id, .. } => {
                f.debug_struct("Delete").field("id", id).finish()
            }
            ResourceRequest::Action { id, action, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("action", action)
                .finish(),
        }
    }
}
