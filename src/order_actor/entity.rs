//! ActorEntity implementation for [`Order`].
//!
//! Orders are indexed by their external session id, so the order actor rejects a second
//! order for the same payment session atomically with the insert.

use super::error::OrderError;
use crate::framework::ActorEntity;
use crate::model::{Order, OrderCreate, OrderId, OrderStatus, OrderUpdate};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = ();
    type ActionResult = ();
    type Context = ();
    type Error = OrderError;

    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, Self::Error> {
        if params.line_items.is_empty() {
            return Err(OrderError::ValidationError(
                "order must contain at least one line item".into(),
            ));
        }
        if let Some(item) = params.line_items.iter().find(|item| item.quantity < 1) {
            return Err(OrderError::ValidationError(format!(
                "quantity for {} must be at least 1",
                item.product_id
            )));
        }
        if matches!(&params.external_session_id, Some(s) if s.trim().is_empty()) {
            return Err(OrderError::ValidationError(
                "external session id must not be empty".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            user_id: params.user_id,
            line_items: params.line_items,
            total_cents: params.total_cents,
            external_session_id: params.external_session_id,
            status: params.status,
            stock_reserved: params.stock_reserved,
            created_at: now,
            updated_at: now,
        })
    }

    fn unique_key(&self) -> Option<String> {
        self.external_session_id.clone()
    }

    async fn on_update(
        &mut self,
        update: OrderUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        match update {
            OrderUpdate::Status {
                expected_status,
                status,
            } => {
                if self.status != expected_status {
                    return Err(OrderError::StaleState(format!(
                        "{} is {}, expected {}",
                        self.id, self.status, expected_status
                    )));
                }
                self.status = status;
                if status == OrderStatus::Cancelled {
                    self.stock_reserved = false;
                }
            }
            OrderUpdate::ClaimReservation { expected_status } => {
                if self.status != expected_status || !self.stock_reserved {
                    return Err(OrderError::StaleState(format!(
                        "{} is {} with stock_reserved={}",
                        self.id, self.status, self.stock_reserved
                    )));
                }
                self.stock_reserved = false;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn handle_action(&mut self, _action: (), _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }
}
