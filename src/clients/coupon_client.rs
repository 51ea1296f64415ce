use crate::coupon_actor::{CouponAction, CouponActionResult, CouponError};
use crate::framework::{ActorClient, FrameworkError, Predicate, ResourceClient};
use crate::model::{Coupon, CouponCreate, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

const GIFT_CODE_PREFIX: &str = "GIFT";
const GIFT_CODE_SUFFIX_LEN: usize = 6;
const MAX_CODE_ATTEMPTS: usize = 5;

/// `GIFT` followed by six random upper-case alphanumerics.
pub fn generate_gift_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GIFT_CODE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{GIFT_CODE_PREFIX}{}", suffix.to_ascii_uppercase())
}

/// Client for the coupon store.
#[derive(Clone)]
pub struct CouponClient {
    inner: ResourceClient<Coupon>,
}

#[async_trait]
impl ActorClient<Coupon> for CouponClient {
    type Error = CouponError;

    fn inner(&self) -> &ResourceClient<Coupon> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        CouponError::from(e)
    }
}

impl CouponClient {
    pub fn new(inner: ResourceClient<Coupon>) -> Self {
        Self { inner }
    }

    /// Stores a coupon with a caller-chosen code.
    #[instrument(skip(self), fields(code = %params.code))]
    pub async fn create_coupon(&self, params: CouponCreate) -> Result<Coupon, CouponError> {
        debug!("Sending request");
        let id = self.inner.create(params).await?;
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| CouponError::NotFound(id.to_string()))
    }

    /// Issues `user` a fresh gift coupon, removing any coupon they already hold.
    #[instrument(skip(self))]
    pub async fn issue_gift(
        &self,
        user: &UserId,
        discount_percent: u8,
        valid_for: Duration,
    ) -> Result<Coupon, CouponError> {
        for old in self.find_by_user(user).await? {
            debug!(code = %old.code, "Replacing existing coupon");
            self.inner.delete(old.id).await?;
        }

        let expires_at = Utc::now() + valid_for;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let params = CouponCreate {
                code: generate_gift_code(),
                user_id: user.clone(),
                discount_percent,
                expires_at,
            };
            match self.create_coupon(params).await {
                Ok(coupon) => {
                    info!(code = %coupon.code, "Gift coupon issued");
                    return Ok(coupon);
                }
                Err(CouponError::CodeCollision(code)) => {
                    debug!(%code, "Gift code already taken, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CouponError::CodeCollision(format!(
            "no free code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        Ok(self.inner.get_by_key(code.to_string()).await?)
    }

    /// The user's active coupon, if any.
    #[instrument(skip(self))]
    pub async fn find_active(&self, user: &UserId) -> Result<Option<Coupon>, CouponError> {
        Ok(self
            .find_by_user(user)
            .await?
            .into_iter()
            .find(|coupon| coupon.active))
    }

    /// Checks that `code` is an active coupon owned by `user` and not yet expired.
    ///
    /// # Errors
    /// `NotFound` for an unknown, foreign or inactive code. `Expired` for a coupon past its
    /// expiry; the coupon is deactivated first so it cannot be tried again.
    #[instrument(skip(self))]
    pub async fn validate(
        &self,
        user: &UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        let coupon = self
            .find_by_code(code)
            .await?
            .filter(|coupon| coupon.active && &coupon.user_id == user)
            .ok_or_else(|| CouponError::NotFound(code.to_string()))?;

        if coupon.is_expired(now) {
            self.inner
                .perform_action(coupon.id, CouponAction::Deactivate)
                .await?;
            info!(%code, "Expired coupon deactivated");
            return Err(CouponError::Expired(code.to_string()));
        }
        Ok(coupon)
    }

    /// Marks the user's coupon inactive.
    ///
    /// Returns `Ok(false)` when there was nothing to do: the coupon was already inactive, or
    /// no coupon with this code belongs to `user`.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str, user: &UserId) -> Result<bool, CouponError> {
        let Some(coupon) = self.find_by_code(code).await? else {
            warn!(%code, "Coupon to deactivate not found");
            return Ok(false);
        };
        if &coupon.user_id != user {
            warn!(%code, owner = %coupon.user_id, "Coupon belongs to another user");
            return Ok(false);
        }

        match self
            .inner
            .perform_action(coupon.id, CouponAction::Deactivate)
            .await?
        {
            CouponActionResult::Deactivated(flipped) => {
                debug!(%code, flipped, "Coupon deactivated");
                Ok(flipped)
            }
        }
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Coupon>, CouponError> {
        let owner = user.clone();
        let filter: Predicate<Coupon> = Box::new(move |coupon: &Coupon| coupon.user_id == owner);
        Ok(self.inner.list(Some(filter)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::ResourceActor;

    fn spawn_store() -> CouponClient {
        let (actor, inner) = ResourceActor::<Coupon>::new(8);
        tokio::spawn(actor.run(()));
        CouponClient::new(inner)
    }

    async fn seed(client: &CouponClient, code: &str, user: &str, expires_at: DateTime<Utc>) {
        client
            .create_coupon(CouponCreate {
                code: code.into(),
                user_id: UserId::new(user),
                discount_percent: 10,
                expires_at,
            })
            .await
            .unwrap();
    }

    #[test]
    fn gift_codes_have_the_expected_shape() {
        let code = generate_gift_code();
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("GIFT"));
        assert!(code[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn issuing_a_gift_replaces_the_old_coupon() {
        let client = spawn_store();
        let user = UserId::new("u1");

        let first = client.issue_gift(&user, 10, Duration::days(30)).await.unwrap();
        let second = client.issue_gift(&user, 10, Duration::days(30)).await.unwrap();

        assert_ne!(first.code, second.code);
        assert_eq!(client.find_by_code(&first.code).await.unwrap(), None);
        assert_eq!(client.find_active(&user).await.unwrap(), Some(second.clone()));
        assert!(second.expires_at > Utc::now() + Duration::days(29));
    }

    #[tokio::test]
    async fn duplicate_codes_collide() {
        let client = spawn_store();
        let at = Utc::now() + Duration::days(1);
        seed(&client, "SAME", "u1", at).await;

        let again = client
            .create_coupon(CouponCreate {
                code: "SAME".into(),
                user_id: UserId::new("u2"),
                discount_percent: 5,
                expires_at: at,
            })
            .await;
        assert_eq!(again, Err(CouponError::CodeCollision("SAME".into())));
    }

    #[tokio::test]
    async fn validate_checks_owner_and_activity() {
        let client = spawn_store();
        let now = Utc::now();
        seed(&client, "SAVE10", "u1", now + Duration::days(1)).await;

        assert!(client.validate(&UserId::new("u1"), "SAVE10", now).await.is_ok());
        assert_eq!(
            client.validate(&UserId::new("u2"), "SAVE10", now).await,
            Err(CouponError::NotFound("SAVE10".into()))
        );
        assert_eq!(
            client.validate(&UserId::new("u1"), "NOPE", now).await,
            Err(CouponError::NotFound("NOPE".into()))
        );
    }

    #[tokio::test]
    async fn expired_coupons_are_deactivated_on_validation() {
        let client = spawn_store();
        let now = Utc::now();
        seed(&client, "OLD", "u1", now - Duration::days(1)).await;

        let result = client.validate(&UserId::new("u1"), "OLD", now).await;
        assert_eq!(result, Err(CouponError::Expired("OLD".into())));

        let stored = client.find_by_code("OLD").await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(
            client.validate(&UserId::new("u1"), "OLD", now).await,
            Err(CouponError::NotFound("OLD".into()))
        );
    }

    #[tokio::test]
    async fn deactivate_is_idempotent() {
        let client = spawn_store();
        let user = UserId::new("u1");
        seed(&client, "ONCE", "u1", Utc::now() + Duration::days(1)).await;

        assert_eq!(client.deactivate("ONCE", &user).await, Ok(true));
        assert_eq!(client.deactivate("ONCE", &user).await, Ok(false));
        assert_eq!(client.deactivate("MISSING", &user).await, Ok(false));
        assert_eq!(client.deactivate("ONCE", &UserId::new("u2")).await, Ok(false));
        assert_eq!(client.find_active(&user).await.unwrap(), None);
    }
}
