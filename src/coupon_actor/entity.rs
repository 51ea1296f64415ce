//! ActorEntity implementation for [`Coupon`]. Coupons are indexed by code.

use super::actions::{CouponAction, CouponActionResult};
use super::error::CouponError;
use crate::framework::ActorEntity;
use crate::model::{Coupon, CouponCreate, CouponId};
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Coupon {
    type Id = CouponId;
    type Create = CouponCreate;
    type Update = ();
    type Action = CouponAction;
    type ActionResult = CouponActionResult;
    type Context = ();
    type Error = CouponError;

    fn from_create_params(id: CouponId, params: CouponCreate) -> Result<Self, Self::Error> {
        if params.code.trim().is_empty() {
            return Err(CouponError::ValidationError("code is required".into()));
        }
        if !(1..=100).contains(&params.discount_percent) {
            return Err(CouponError::ValidationError(format!(
                "discount must be between 1 and 100 percent, got {}",
                params.discount_percent
            )));
        }
        Ok(Self {
            id,
            code: params.code,
            user_id: params.user_id,
            discount_percent: params.discount_percent,
            expires_at: params.expires_at,
            active: true,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.code.clone())
    }

    async fn on_update(&mut self, _update: (), _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: CouponAction,
        _ctx: &Self::Context,
    ) -> Result<CouponActionResult, Self::Error> {
        match action {
            CouponAction::Deactivate => {
                let was_active = self.active;
                self.active = false;
                Ok(CouponActionResult::Deactivated(was_active))
            }
        }
    }
}
