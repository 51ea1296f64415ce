use crate::framework::{ActorClient, FrameworkError, Predicate, ResourceClient};
use crate::model::{Order, OrderCreate, OrderId, OrderStatus, OrderUpdate, UserId};
use crate::order_actor::OrderError;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the order store.
///
/// Persists and queries orders. Status legality is checked by the lifecycle manager before
/// `update_status` is called.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        OrderError::from(e)
    }
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Persists a new order and returns it as stored.
    ///
    /// # Errors
    /// `ValidationError` for an empty order or a zero quantity, `DuplicateSession` when the
    /// external session id is already taken.
    #[instrument(skip(self, params), fields(user_id = %params.user_id))]
    pub async fn create(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!(?params, "create called");
        let id = self.inner.create(params).await?;
        self.find_by_id(id).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: OrderId) -> Result<Order, OrderError> {
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Exact lookup on the unique session index.
    #[instrument(skip(self))]
    pub async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.inner.get_by_key(session_id.to_string()).await?)
    }

    /// The user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderError> {
        let owner = user_id.clone();
        let filter: Predicate<Order> = Box::new(move |order: &Order| order.user_id == owner);
        let orders = self.inner.list(Some(filter)).await?;
        Ok(newest_first(orders))
    }

    /// Every order, newest first.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Order>, OrderError> {
        let orders = self.inner.list(None).await?;
        Ok(newest_first(orders))
    }

    /// Persists `status` without checking that the transition is allowed.
    ///
    /// The write only lands if the order is still in `expected_status`. Moving into
    /// CANCELLED clears `stock_reserved` but releases nothing; see
    /// [`claim_reservation`](Self::claim_reservation).
    ///
    /// # Errors
    /// `StaleState` when the order moved since `expected_status` was read.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        expected_status: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        debug!("Sending request");
        let update = OrderUpdate::Status {
            expected_status,
            status,
        };
        Ok(self.inner.update(id, update).await?)
    }

    /// Clears the order's reservation flag if it is set and the status is unchanged.
    ///
    /// # Errors
    /// `StaleState` when another caller already claimed the reservation or moved the order.
    #[instrument(skip(self))]
    pub async fn claim_reservation(
        &self,
        id: OrderId,
        expected_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let update = OrderUpdate::ClaimReservation { expected_status };
        Ok(self.inner.update(id, update).await?)
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.0.cmp(&a.id.0))
    });
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::{ActorClient, ResourceActor};
    use crate::model::{LineItem, ProductId};

    fn params(user: &str, session: Option<&str>) -> OrderCreate {
        let mut params =
            OrderCreate::from_items(UserId::new(user), vec![LineItem::new(ProductId(1), 2, 500)])
                .unwrap();
        params.external_session_id = session.map(str::to_string);
        params
    }

    fn spawn_store() -> OrderClient {
        let (actor, inner) = ResourceActor::<Order>::new(8);
        tokio::spawn(actor.run(()));
        OrderClient::new(inner)
    }

    #[tokio::test]
    async fn create_returns_the_stored_order() {
        let client = spawn_store();
        let order = client.create(params("u1", Some("sess_1"))).await.unwrap();

        assert_eq!(order.total_cents, 1_000);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(client.find_by_id(order.id).await.unwrap(), order);
        assert_eq!(client.get(order.id).await.unwrap(), Some(order.clone()));
        assert_eq!(
            client.find_by_session_id("sess_1").await.unwrap(),
            Some(order)
        );
        assert_eq!(client.find_by_session_id("sess_2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_order_for_a_session_is_a_duplicate() {
        let client = spawn_store();
        client.create(params("u1", Some("sess_1"))).await.unwrap();

        let again = client.create(params("u2", Some("sess_1"))).await;
        assert_eq!(again, Err(OrderError::DuplicateSession("sess_1".into())));
        assert_eq!(client.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn queries_are_newest_first_and_scoped_by_user() {
        let client = spawn_store();
        let first = client.create(params("u1", None)).await.unwrap();
        client.create(params("u2", None)).await.unwrap();
        let third = client.create(params("u1", None)).await.unwrap();

        let mine: Vec<OrderId> = client
            .find_by_user(&UserId::new("u1"))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec![third.id, first.id]);
        assert_eq!(client.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_status_persists_without_judging() {
        let client = spawn_store();
        let order = client.create(params("u1", None)).await.unwrap();

        let shipped = client
            .update_status(order.id, OrderStatus::Processing, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let stale = client
            .update_status(order.id, OrderStatus::Processing, OrderStatus::Approved)
            .await;
        assert!(matches!(stale, Err(OrderError::StaleState(_))));

        let missing = client
            .update_status(OrderId(99), OrderStatus::Processing, OrderStatus::Shipped)
            .await;
        assert_eq!(missing, Err(OrderError::NotFound("order_99".into())));
    }

    #[tokio::test]
    async fn validation_errors_come_back_typed() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_create()
            .return_err(FrameworkError::EntityError(Box::new(
                OrderError::ValidationError("empty".into()),
            )));

        let client = OrderClient::new(mock.client());
        let result = client.create(params("u1", None)).await;
        assert_eq!(result, Err(OrderError::ValidationError("empty".into())));
        mock.verify();
    }
}
