use crate::framework::{ActorClient, FrameworkError, ResourceClient};
use crate::model::{Product, ProductCreate, ProductId, ProductUpdate};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the inventory ledger.
///
/// `reserve_stock` and `release_stock` are the only ways stock changes after a product is
/// created.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

#[async_trait]
impl ActorClient<Product> for ProductClient {
    type Error = ProductError;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        ProductError::from(e)
    }
}

impl ProductClient {
    pub fn new(inner: ResourceClient<Product>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<ProductId, ProductError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    /// Like `get`, but a missing product is an error.
    #[instrument(skip(self))]
    pub async fn find(&self, id: ProductId) -> Result<Product, ProductError> {
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: ProductId) -> Result<u32, ProductError> {
        match self.inner.perform_action(id, ProductAction::CheckStock).await? {
            ProductActionResult::CheckStock(stock) => Ok(stock),
            other => Err(unexpected(other)),
        }
    }

    /// Atomically takes `quantity` out of stock. Returns the remaining stock.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, ProductAction::Reserve(quantity))
            .await?
        {
            ProductActionResult::Reserved(stock) => Ok(stock),
            other => Err(unexpected(other)),
        }
    }

    /// Puts `quantity` back into stock. Returns the new stock level.
    #[instrument(skip(self))]
    pub async fn release_stock(&self, id: ProductId, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, ProductAction::Release(quantity))
            .await?
        {
            ProductActionResult::Released(stock) => Ok(stock),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(result: ProductActionResult) -> ProductError {
    ProductError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}
