//! HTTP adapter for the coupon service.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use coupon_http::error::AppError;
use serde::{Deserialize, Serialize};

use super::models::{Basket, Coupon};
use super::service::{CouponError, CouponService};

/// Wrapper for successful response bodies: `{"data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub min_basket_value: i64,
}

/// Public view of a coupon; the internal id is not exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    pub code: String,
    pub discount: i64,
    pub min_basket_value: i64,
}

impl From<Coupon> for CouponView {
    fn from(coupon: Coupon) -> Self {
        Self {
            code: coupon.code,
            discount: coupon.discount,
            min_basket_value: coupon.min_basket_value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetCouponsQuery {
    pub codes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BasketRequest {
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyCouponRequest {
    pub basket: Option<BasketRequest>,
    #[serde(default)]
    pub code: String,
}

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        if err.is_client_error() {
            AppError::bad_request_with_code(err.code(), err.to_string())
        } else {
            AppError::internal(err)
        }
    }
}

/// Routes relative to the module mount point
pub fn routes(service: CouponService) -> Router {
    Router::new()
        .route("/", post(create_coupon).get(get_coupons))
        .route("/basket", post(apply_coupon))
        .with_state(service)
}

fn rejected(rejection: JsonRejection) -> AppError {
    tracing::warn!(error = %rejection, "error occurred while binding body");
    AppError::bad_request(rejection.body_text())
}

/// Zero values count as missing, the same as an absent field
fn require(field: &str, present: bool) -> Result<(), AppError> {
    if present {
        Ok(())
    } else {
        tracing::warn!(field, "required field missing");
        Err(AppError::bad_request(format!("field '{}' is required", field)))
    }
}

async fn create_coupon(
    State(service): State<CouponService>,
    payload: Result<Json<CreateCouponRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(body) = payload.map_err(rejected)?;
    require("code", !body.code.is_empty())?;
    require("discount", body.discount != 0)?;
    require("minBasketValue", body.min_basket_value != 0)?;

    service
        .create_coupon(body.discount, &body.code, body.min_basket_value)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "error occurred while creating coupon"))?;

    Ok(StatusCode::CREATED)
}

async fn get_coupons(
    State(service): State<CouponService>,
    Query(query): Query<GetCouponsQuery>,
) -> Result<Json<DataResponse<Vec<CouponView>>>, AppError> {
    let raw_codes = query.codes.unwrap_or_default();
    if raw_codes.is_empty() {
        tracing::warn!("error occurred while getting coupons, missing codes");
        return Err(AppError::bad_request("no code specified"));
    }

    let codes: Vec<&str> = raw_codes.split(',').collect();

    let coupons = service
        .get_coupons(&codes)
        .await
        .inspect_err(|err| tracing::error!(error = %err, "error occurred while getting coupons"))?;

    if coupons.is_empty() {
        tracing::debug!(codes = %raw_codes, "no coupons found");
        return Err(AppError::not_found("no coupons found"));
    }

    Ok(Json(DataResponse {
        data: coupons.into_iter().map(CouponView::from).collect(),
    }))
}

async fn apply_coupon(
    State(service): State<CouponService>,
    payload: Result<Json<ApplyCouponRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Basket>>, AppError> {
    let Json(body) = payload.map_err(rejected)?;
    let basket = body.basket.unwrap_or_default();
    require("basket.value", basket.value != 0)?;

    let applied = service
        .apply_coupon(Basket::with_value(basket.value), &body.code)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "error occurred while applying coupon"))?;

    Ok(Json(DataResponse { data: applied }))
}
