//! ActorEntity implementation for [`Product`].
//!
//! The reservation logic lives here: `handle_action` is executed by the product actor one
//! message at a time, so `Reserve` is a single atomic "decrement if sufficient".

use super::actions::{ProductAction, ProductActionResult};
use super::error::ProductError;
use crate::framework::ActorEntity;
use crate::model::{Product, ProductCreate, ProductId, ProductUpdate};
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Product {
    type Id = ProductId;
    type Create = ProductCreate;
    type Update = ProductUpdate;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Context = ();
    type Error = ProductError;

    fn from_create_params(id: ProductId, params: ProductCreate) -> Result<Self, Self::Error> {
        if params.name.trim().is_empty() {
            return Err(ProductError::ValidationError("name is required".into()));
        }
        Ok(Self::new(id, params.name, params.price_cents, params.stock))
    }

    async fn on_update(
        &mut self,
        update: ProductUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price_cents {
            self.price_cents = price;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ProductAction,
        _ctx: &Self::Context,
    ) -> Result<ProductActionResult, Self::Error> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::CheckStock(self.stock)),
            ProductAction::Reserve(0) | ProductAction::Release(0) => {
                Err(ProductError::InvalidQuantity(0))
            }
            ProductAction::Reserve(quantity) => {
                if self.stock < quantity {
                    return Err(ProductError::InsufficientStock {
                        product: self.id,
                        requested: quantity,
                        available: self.stock,
                    });
                }
                self.stock -= quantity;
                Ok(ProductActionResult::Reserved(self.stock))
            }
            ProductAction::Release(quantity) => {
                self.stock = self
                    .stock
                    .checked_add(quantity)
                    .ok_or(ProductError::StockOverflow {
                        product: self.id,
                        stock: self.stock,
                        released: quantity,
                    })?;
                Ok(ProductActionResult::Released(self.stock))
            }
        }
    }
}
