//! # Generic Actor Server
//!
//! `ResourceActor` owns the collection for one entity type and processes requests one at a
//! time. Everything a single message handler does is therefore atomic with respect to every
//! other caller of the same actor: a check-and-decrement inside `handle_action` cannot be
//! interleaved with another reservation, and a unique-key check followed by an insert cannot
//! race a second insert.

use crate::framework::client::ResourceClient;
use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of entities.
///
/// # Usage Pattern
///
/// 1. **Create**: `ResourceActor::new()` returns the actor (server) and a client.
/// 2. **Wire**: pass dependencies into `actor.run(context)`.
/// 3. **Run**: spawn the run loop in a background task.
///
/// # Operations
///
/// * **Create**: allocate the next id, build the entity, reject a taken unique key with
///   `Conflict`, run `on_create`, then insert and index it.
/// * **Get / GetByKey**: clone out the entity, by id or by unique key.
/// * **List**: clone out every entity matching the optional predicate.
/// * **Update / Action**: mutate in place through the entity's hooks.
/// * **Delete**: run `on_delete`, then remove the entity and its key.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    keys: HashMap<String, T::Id>,
    next_id: u32,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait for space when
    /// it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            keys: HashMap::new(),
            next_id: 1,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let result = self.create(params, &context).await;
                    match &result {
                        Ok(id) => info!(entity_type, %id, size = self.store.len(), "Created"),
                        Err(e) => warn!(entity_type, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::GetByKey { key, respond_to } => {
                    let item = self
                        .keys
                        .get(&key)
                        .and_then(|id| self.store.get(id))
                        .cloned();
                    debug!(entity_type, %key, found = item.is_some(), "GetByKey");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = match filter {
                        Some(pred) => self.store.values().filter(|&t| pred(t)).cloned().collect(),
                        None => self.store.values().cloned().collect(),
                    };
                    debug!(entity_type, count = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    if let Some(item) = self.store.get_mut(&id) {
                        if let Err(e) = item.on_update(update, &context).await {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                        info!(entity_type, %id, "Updated");
                        let _ = respond_to.send(Ok(item.clone()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    if let Some(item) = self.store.get(&id) {
                        if let Err(e) = item.on_delete(&context).await {
                            warn!(entity_type, %id, error = %e, "on_delete failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                        if let Some(key) = item.unique_key() {
                            self.keys.remove(&key);
                        }
                        self.store.remove(&id);
                        info!(entity_type, %id, size = self.store.len(), "Deleted");
                        let _ = respond_to.send(Ok(()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    if let Some(item) = self.store.get_mut(&id) {
                        let result = item
                            .handle_action(action, &context)
                            .await
                            .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                        match &result {
                            Ok(_) => info!(entity_type, %id, "Action ok"),
                            Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                        }
                        let _ = respond_to.send(result);
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    async fn create(
        &mut self,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let id = T::Id::from(self.next_id);
        let mut item = T::from_create_params(id.clone(), params)
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;

        let key = item.unique_key();
        if let Some(key) = &key {
            if self.keys.contains_key(key) {
                return Err(FrameworkError::Conflict(key.clone()));
            }
        }

        item.on_create(context)
            .await
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;

        // Ids are only consumed by entities that actually get stored.
        self.next_id += 1;
        if let Some(key) = key {
            self.keys.insert(key, id.clone());
        }
        self.store.insert(id.clone(), item);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Ticket {
        id: u32,
        token: Option<String>,
        redeemed: bool,
    }

    #[derive(Debug)]
    struct TicketCreate {
        token: Option<String>,
    }

    #[derive(Debug)]
    enum TicketAction {
        Redeem,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("already redeemed")]
    struct AlreadyRedeemed;

    #[async_trait]
    impl ActorEntity for Ticket {
        type Id = u32;
        type Create = TicketCreate;
        type Update = ();
        type Action = TicketAction;
        type ActionResult = ();
        type Context = ();
        type Error = AlreadyRedeemed;

        fn from_create_params(id: u32, params: TicketCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                token: params.token,
                redeemed: false,
            })
        }

        fn unique_key(&self) -> Option<String> {
            self.token.clone()
        }

        async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn handle_action(&mut self, action: TicketAction, _: &()) -> Result<(), Self::Error> {
            match action {
                TicketAction::Redeem if self.redeemed => Err(AlreadyRedeemed),
                TicketAction::Redeem => {
                    self.redeemed = true;
                    Ok(())
                }
            }
        }
    }

    #[tokio::test]
    async fn unique_key_rejects_second_create() {
        let (actor, client) = ResourceActor::<Ticket>::new(8);
        tokio::spawn(actor.run(()));

        let first = client
            .create(TicketCreate {
                token: Some("t-1".into()),
            })
            .await
            .unwrap();
        let second = client
            .create(TicketCreate {
                token: Some("t-1".into()),
            })
            .await;
        assert!(matches!(second, Err(FrameworkError::Conflict(k)) if k == "t-1"));

        let found = client.get_by_key("t-1".into()).await.unwrap().unwrap();
        assert_eq!(found.id, first);

        // Entities without a key never collide.
        client.create(TicketCreate { token: None }).await.unwrap();
        client.create(TicketCreate { token: None }).await.unwrap();
        assert_eq!(client.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rejected_create_does_not_consume_an_id() {
        let (actor, client) = ResourceActor::<Ticket>::new(8);
        tokio::spawn(actor.run(()));

        client
            .create(TicketCreate {
                token: Some("a".into()),
            })
            .await
            .unwrap();
        let _ = client
            .create(TicketCreate {
                token: Some("a".into()),
            })
            .await;
        let next = client.create(TicketCreate { token: None }).await.unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn list_applies_predicate_and_delete_frees_key() {
        let (actor, client) = ResourceActor::<Ticket>::new(8);
        tokio::spawn(actor.run(()));

        let id = client
            .create(TicketCreate {
                token: Some("x".into()),
            })
            .await
            .unwrap();
        client.create(TicketCreate { token: None }).await.unwrap();
        client.perform_action(id, TicketAction::Redeem).await.unwrap();

        let redeemed = client
            .list(Some(Box::new(|t: &Ticket| t.redeemed)))
            .await
            .unwrap();
        assert_eq!(redeemed.len(), 1);

        let again = client.perform_action(id, TicketAction::Redeem).await;
        assert!(again.unwrap_err().downcast::<AlreadyRedeemed>().is_ok());

        client.delete(id).await.unwrap();
        assert!(client.get_by_key("x".into()).await.unwrap().is_none());
        client
            .create(TicketCreate {
                token: Some("x".into()),
            })
            .await
            .unwrap();
    }
}
