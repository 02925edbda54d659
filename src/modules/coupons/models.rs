use serde::{Deserialize, Serialize};

/// A discount coupon keyed by its human-entered code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Opaque identifier generated on creation
    pub id: String,
    /// Lookup key, unique among stored coupons
    pub code: String,
    /// Percentage taken off the basket, 0 to 100
    pub discount: i64,
    /// Minimum basket total required to redeem
    pub min_basket_value: i64,
}

/// Basket total before and after a coupon is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    pub value: i64,
    pub applied_discount: i64,
    pub application_successful: bool,
}

impl Basket {
    /// A basket that has not had any coupon applied yet.
    pub const fn with_value(value: i64) -> Self {
        Self {
            value,
            applied_discount: 0,
            application_successful: false,
        }
    }
}
