//! Coupon service application library
//!
//! Coupon issuing, lookup by code, and basket discount application, packaged
//! as modules for the HTTP server.

pub mod modules;

pub use modules::coupons::{
    models::{Basket, Coupon},
    service::{CouponError, CouponService},
    store::{CouponRepository, MemoryCouponRepository, StoreError},
};
