//! Coupon storage.
//!
//! The service only talks to [`CouponRepository`]; [`MemoryCouponRepository`]
//! is the process-lifetime backend used by the binary and the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use super::models::Coupon;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No coupon is stored under the requested code.
    #[error("coupon not found")]
    NotFound,

    #[error("coupon store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for coupons keyed by code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Returns the coupon stored under `code`, or [`StoreError::NotFound`].
    async fn find_by_code(&self, code: &str) -> StoreResult<Coupon>;

    /// Inserts `coupon`, replacing any entry with the same code.
    async fn save(&self, coupon: Coupon) -> StoreResult<()>;
}

/// In-memory coupon store guarded by a single mutex.
#[derive(Debug, Default)]
pub struct MemoryCouponRepository {
    entries: Mutex<HashMap<String, Coupon>>,
}

impl MemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, Coupon>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("coupon map lock poisoned".to_string()))
    }
}

#[async_trait]
impl CouponRepository for MemoryCouponRepository {
    async fn find_by_code(&self, code: &str) -> StoreResult<Coupon> {
        self.lock()?.get(code).cloned().ok_or(StoreError::NotFound)
    }

    async fn save(&self, coupon: Coupon) -> StoreResult<()> {
        self.lock()?.insert(coupon.code.clone(), coupon);
        Ok(())
    }
}
