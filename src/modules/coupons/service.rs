//! Coupon creation, lookup and basket discount rules.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use super::models::{Basket, Coupon};
use super::store::{CouponRepository, StoreError};

pub const MAX_DISCOUNT: i64 = 100;

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("invalid code")]
    InvalidCode,

    #[error("invalid discount")]
    InvalidDiscount,

    #[error("invalid min basket")]
    InvalidMinBasketValue,

    #[error("invalid basket value")]
    InvalidBasketValue,

    #[error("not sufficient basket value")]
    MinBasketValueNotMet,

    #[error("coupon not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CouponError {
    /// Stable machine-readable code for client-facing error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CouponError::InvalidCode => "invalid_code",
            CouponError::InvalidDiscount => "invalid_discount",
            CouponError::InvalidMinBasketValue => "invalid_min_basket_value",
            CouponError::InvalidBasketValue => "invalid_basket_value",
            CouponError::MinBasketValueNotMet => "min_basket_value_not_met",
            CouponError::NotFound => "coupon_not_found",
            CouponError::Store(_) => "store_failure",
        }
    }

    /// Whether the caller can fix the request; store failures are not.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CouponError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, CouponError>;

/// Domain service over a [`CouponRepository`]. Holds no state of its own.
#[derive(Clone)]
pub struct CouponService {
    repo: Arc<dyn CouponRepository>,
}

impl CouponService {
    pub fn new(repo: Arc<dyn CouponRepository>) -> Self {
        Self { repo }
    }

    /// Validate and store a new coupon under `code`.
    #[tracing::instrument(skip(self))]
    pub async fn create_coupon(&self, discount: i64, code: &str, min_basket_value: i64) -> Result<()> {
        if code.is_empty() {
            return Err(CouponError::InvalidCode);
        }

        if !(0..=MAX_DISCOUNT).contains(&discount) {
            return Err(CouponError::InvalidDiscount);
        }

        if min_basket_value < 0 {
            return Err(CouponError::InvalidMinBasketValue);
        }

        // Any lookup outcome other than NotFound counts as "code taken",
        // store failures included. Clients see 400 instead of 500 here.
        match self.repo.find_by_code(code).await {
            Err(StoreError::NotFound) => {}
            Ok(_) => return Err(CouponError::InvalidCode),
            Err(err) => {
                tracing::warn!(error = %err, "duplicate check failed, rejecting code");
                return Err(CouponError::InvalidCode);
            }
        }

        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            discount,
            min_basket_value,
        };
        let id = coupon.id.clone();

        self.repo.save(coupon).await?;

        tracing::info!(%id, "coupon created");
        Ok(())
    }

    /// Look up each code in order. Unknown codes are skipped; any other
    /// store failure fails the whole call.
    #[tracing::instrument(skip(self, codes), fields(count = codes.len()))]
    pub async fn get_coupons<S>(&self, codes: &[S]) -> Result<Vec<Coupon>>
    where
        S: AsRef<str> + Sync,
    {
        let mut coupons = Vec::with_capacity(codes.len());

        for code in codes {
            match self.repo.find_by_code(code.as_ref()).await {
                Ok(coupon) => coupons.push(coupon),
                Err(StoreError::NotFound) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(coupons)
    }

    /// Apply the coupon stored under `code` to `basket`.
    #[tracing::instrument(skip(self))]
    pub async fn apply_coupon(&self, basket: Basket, code: &str) -> Result<Basket> {
        if basket.value <= 0 {
            return Err(CouponError::InvalidBasketValue);
        }

        if code.is_empty() {
            return Err(CouponError::InvalidCode);
        }

        let coupon = self.repo.find_by_code(code).await.map_err(|err| match err {
            StoreError::NotFound => CouponError::NotFound,
            other => CouponError::Store(other),
        })?;

        if basket.value < coupon.min_basket_value {
            return Err(CouponError::MinBasketValueNotMet);
        }

        let discount_amount = discount_amount(basket.value, coupon.discount);

        Ok(Basket {
            value: basket.value - discount_amount,
            applied_discount: coupon.discount,
            application_successful: true,
        })
    }
}

/// `floor(value * discount / 100)` for a positive `value`. The discount is
/// clamped to `0..=MAX_DISCOUNT`, so the result lies in `0..=value`.
fn discount_amount(value: i64, discount: i64) -> i64 {
    let discount = discount.clamp(0, MAX_DISCOUNT);
    // Split on the divisor so no intermediate product exceeds `value`.
    value / MAX_DISCOUNT * discount + value % MAX_DISCOUNT * discount / MAX_DISCOUNT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::coupons::store::{MemoryCouponRepository, MockCouponRepository};

    fn coupon(code: &str, discount: i64, min_basket_value: i64) -> Coupon {
        Coupon {
            id: format!("id-{code}"),
            code: code.to_string(),
            discount,
            min_basket_value,
        }
    }

    fn memory_service() -> (CouponService, Arc<MemoryCouponRepository>) {
        let repo = Arc::new(MemoryCouponRepository::new());
        (CouponService::new(repo.clone()), repo)
    }

    fn mock_service(repo: MockCouponRepository) -> CouponService {
        CouponService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_create_coupon_stores_coupon() {
        let (service, repo) = memory_service();

        service.create_coupon(10, "summer", 100).await.unwrap();

        let stored = repo.find_by_code("summer").await.unwrap();
        assert_eq!(stored.code, "summer");
        assert_eq!(stored.discount, 10);
        assert_eq!(stored.min_basket_value, 100);
        assert!(Uuid::parse_str(&stored.id).is_ok());
    }

    #[tokio::test]
    async fn test_create_coupon_generates_distinct_ids() {
        let (service, repo) = memory_service();

        service.create_coupon(10, "a", 0).await.unwrap();
        service.create_coupon(10, "b", 0).await.unwrap();

        let a = repo.find_by_code("a").await.unwrap();
        let b = repo.find_by_code("b").await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_create_coupon_validation_order() {
        let (service, _) = memory_service();

        // Every field invalid: the code check wins
        assert!(matches!(
            service.create_coupon(-1, "", -1).await,
            Err(CouponError::InvalidCode)
        ));
        assert!(matches!(
            service.create_coupon(101, "x", -1).await,
            Err(CouponError::InvalidDiscount)
        ));
        assert!(matches!(
            service.create_coupon(50, "x", -1).await,
            Err(CouponError::InvalidMinBasketValue)
        ));
    }

    #[tokio::test]
    async fn test_create_coupon_discount_bounds() {
        let (service, _) = memory_service();

        for discount in [-10, -1, 101, 1000] {
            assert!(matches!(
                service.create_coupon(discount, "bounds", 0).await,
                Err(CouponError::InvalidDiscount)
            ));
        }

        service.create_coupon(0, "zero", 0).await.unwrap();
        service.create_coupon(100, "full", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_coupon_rejects_duplicate_code() {
        let (service, repo) = memory_service();

        service.create_coupon(10, "dup", 100).await.unwrap();
        let second = service.create_coupon(50, "dup", 0).await;

        assert!(matches!(second, Err(CouponError::InvalidCode)));
        assert_eq!(repo.find_by_code("dup").await.unwrap().discount, 10);
    }

    #[tokio::test]
    async fn test_create_coupon_store_failure_on_lookup_reports_invalid_code() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));
        repo.expect_save().never();

        let service = mock_service(repo);
        assert!(matches!(
            service.create_coupon(10, "code", 0).await,
            Err(CouponError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_create_coupon_surfaces_save_failure() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Err(StoreError::NotFound));
        repo.expect_save()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));

        let service = mock_service(repo);
        let err = service.create_coupon(10, "code", 0).await.unwrap_err();
        assert!(matches!(err, CouponError::Store(StoreError::Unavailable(_))));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_create_coupon_validation_failure_skips_store() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code().never();
        repo.expect_save().never();

        let service = mock_service(repo);
        assert!(service.create_coupon(200, "code", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_get_coupons_skips_missing_codes() {
        let (service, repo) = memory_service();
        repo.save(coupon("a", 10, 0)).await.unwrap();
        repo.save(coupon("b", 20, 50)).await.unwrap();

        let coupons = service.get_coupons(&["a", "missing", "b"]).await.unwrap();

        assert_eq!(coupons, vec![coupon("a", 10, 0), coupon("b", 20, 50)]);
    }

    #[tokio::test]
    async fn test_get_coupons_keeps_duplicates_and_order() {
        let (service, repo) = memory_service();
        repo.save(coupon("a", 10, 0)).await.unwrap();
        repo.save(coupon("b", 20, 0)).await.unwrap();

        let codes = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let found: Vec<_> = service
            .get_coupons(&codes)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();

        assert_eq!(found, vec!["b", "a", "b"]);
    }

    #[tokio::test]
    async fn test_get_coupons_empty_result_is_not_an_error() {
        let (service, _) = memory_service();
        let empty: [&str; 0] = [];

        assert!(service.get_coupons(&["nope"]).await.unwrap().is_empty());
        assert!(service.get_coupons(&empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_coupons_aborts_on_store_failure() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code().returning(|code| match code {
            "a" => Ok(coupon("a", 10, 0)),
            "broken" => Err(StoreError::Unavailable("timeout".to_string())),
            _ => Err(StoreError::NotFound),
        });

        let service = mock_service(repo);
        let result = service.get_coupons(&["a", "broken", "c"]).await;

        assert!(matches!(
            result,
            Err(CouponError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_apply_coupon_discount_arithmetic() {
        let (service, repo) = memory_service();
        repo.save(coupon("ten", 10, 100)).await.unwrap();

        let basket = service
            .apply_coupon(Basket::with_value(200), "ten")
            .await
            .unwrap();

        assert_eq!(
            basket,
            Basket {
                value: 180,
                applied_discount: 10,
                application_successful: true,
            }
        );
    }

    #[tokio::test]
    async fn test_apply_coupon_truncates_discount_amount() {
        let (service, repo) = memory_service();
        repo.save(coupon("third", 33, 0)).await.unwrap();

        // 99 * 33 / 100 = 32.67, truncated to 32
        let basket = service
            .apply_coupon(Basket::with_value(99), "third")
            .await
            .unwrap();
        assert_eq!(basket.value, 67);
    }

    #[tokio::test]
    async fn test_apply_coupon_edge_discounts() {
        let (service, repo) = memory_service();
        repo.save(coupon("none", 0, 0)).await.unwrap();
        repo.save(coupon("all", 100, 0)).await.unwrap();

        let untouched = service.apply_coupon(Basket::with_value(75), "none").await.unwrap();
        assert_eq!(untouched.value, 75);
        assert!(untouched.application_successful);

        let free = service.apply_coupon(Basket::with_value(75), "all").await.unwrap();
        assert_eq!(free.value, 0);
        assert_eq!(free.applied_discount, 100);
    }

    #[tokio::test]
    async fn test_apply_coupon_does_not_overflow() {
        let (service, repo) = memory_service();
        repo.save(coupon("big", 50, 0)).await.unwrap();

        let basket = service
            .apply_coupon(Basket::with_value(i64::MAX), "big")
            .await
            .unwrap();
        assert_eq!(basket.value, i64::MAX - i64::MAX / 2);
    }

    #[tokio::test]
    async fn test_apply_coupon_min_basket_not_met() {
        let (service, repo) = memory_service();
        repo.save(coupon("ten", 10, 100)).await.unwrap();

        let result = service.apply_coupon(Basket::with_value(50), "ten").await;
        assert!(matches!(result, Err(CouponError::MinBasketValueNotMet)));

        // Exactly the minimum is enough
        let at_minimum = service.apply_coupon(Basket::with_value(100), "ten").await.unwrap();
        assert_eq!(at_minimum.value, 90);
    }

    #[tokio::test]
    async fn test_apply_coupon_rejects_non_positive_basket_before_lookup() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code().never();

        let service = mock_service(repo);
        for value in [-50, 0] {
            assert!(matches!(
                service.apply_coupon(Basket::with_value(value), "any").await,
                Err(CouponError::InvalidBasketValue)
            ));
        }
    }

    #[tokio::test]
    async fn test_apply_coupon_rejects_empty_code_before_lookup() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code().never();

        let service = mock_service(repo);
        assert!(matches!(
            service.apply_coupon(Basket::with_value(-50), "").await,
            Err(CouponError::InvalidBasketValue)
        ));
        assert!(matches!(
            service.apply_coupon(Basket::with_value(100), "").await,
            Err(CouponError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_apply_coupon_clamps_out_of_range_stored_discount() {
        let (service, repo) = memory_service();
        repo.save(coupon("negative", -50, 0)).await.unwrap();
        repo.save(coupon("excess", 150, 0)).await.unwrap();

        let untouched = service
            .apply_coupon(Basket::with_value(i64::MAX), "negative")
            .await
            .unwrap();
        assert_eq!(untouched.value, i64::MAX);
        assert_eq!(untouched.applied_discount, -50);

        let free = service
            .apply_coupon(Basket::with_value(i64::MAX), "excess")
            .await
            .unwrap();
        assert_eq!(free.value, 0);
    }

    #[test]
    fn test_discount_amount_matches_wide_arithmetic() {
        for value in [1, 99, 101, 12_345, i64::MAX / 3, i64::MAX] {
            for discount in [0, 1, 33, 50, 99, 100] {
                let wide = i128::from(value) * i128::from(discount) / 100;
                let amount = discount_amount(value, discount);
                assert_eq!(i128::from(amount), wide, "{value} * {discount}");
            }
        }
    }

    #[tokio::test]
    async fn test_apply_coupon_unknown_code() {
        let (service, _) = memory_service();

        let result = service.apply_coupon(Basket::with_value(100), "ghost").await;
        assert!(matches!(result, Err(CouponError::NotFound)));
    }

    #[tokio::test]
    async fn test_apply_coupon_surfaces_store_failure() {
        let mut repo = MockCouponRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));

        let service = mock_service(repo);
        let err = service
            .apply_coupon(Basket::with_value(100), "code")
            .await
            .unwrap_err();
        assert!(matches!(err, CouponError::Store(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(CouponError::InvalidCode.code(), "invalid_code");
        assert_eq!(CouponError::MinBasketValueNotMet.code(), "min_basket_value_not_met");
        assert!(CouponError::NotFound.is_client_error());
        assert!(!CouponError::Store(StoreError::NotFound).is_client_error());
    }
}
