pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use coupon_kernel::{InitCtx, Module};

use service::CouponService;
use store::{CouponRepository, MemoryCouponRepository};

/// Coupon issuing and basket discount module
pub struct CouponsModule {
    service: CouponService,
}

impl CouponsModule {
    pub fn new(repo: Arc<dyn CouponRepository>) -> Self {
        Self {
            service: CouponService::new(repo),
        }
    }

    pub fn service(&self) -> &CouponService {
        &self.service
    }
}

#[async_trait]
impl Module for CouponsModule {
    fn name(&self) -> &'static str {
        "coupons"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "coupons module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::routes(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create a coupon",
                        "tags": ["Coupons"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateCoupon" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Coupon created" },
                            "400": error_response("Invalid coupon"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "get": {
                        "summary": "Get coupons by code",
                        "tags": ["Coupons"],
                        "parameters": [{
                            "name": "codes",
                            "in": "query",
                            "required": true,
                            "description": "Comma-separated coupon codes",
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Coupons found, in request order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "data": {
                                                    "type": "array",
                                                    "items": { "$ref": "#/components/schemas/Coupon" }
                                                }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error_response("Missing codes"),
                            "404": error_response("No coupons found"),
                            "500": error_response("Internal server error")
                        }
                    }
                },
                "/basket": {
                    "post": {
                        "summary": "Apply a coupon to a basket",
                        "tags": ["Coupons"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ApplyCoupon" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Discounted basket",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "data": { "$ref": "#/components/schemas/Basket" }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error_response("Coupon cannot be applied"),
                            "500": error_response("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Coupon": {
                        "type": "object",
                        "properties": {
                            "code": { "type": "string" },
                            "discount": { "type": "integer", "minimum": 0, "maximum": 100 },
                            "minBasketValue": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["code", "discount", "minBasketValue"]
                    },
                    "CreateCoupon": {
                        "type": "object",
                        "properties": {
                            "code": { "type": "string" },
                            "discount": { "type": "integer", "minimum": 1, "maximum": 100 },
                            "minBasketValue": { "type": "integer", "minimum": 1 }
                        },
                        "required": ["code", "discount", "minBasketValue"]
                    },
                    "ApplyCoupon": {
                        "type": "object",
                        "properties": {
                            "basket": {
                                "type": "object",
                                "properties": { "value": { "type": "integer" } },
                                "required": ["value"]
                            },
                            "code": { "type": "string" }
                        },
                        "required": ["basket", "code"]
                    },
                    "Basket": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "integer" },
                            "appliedDiscount": { "type": "integer" },
                            "applicationSuccessful": { "type": "boolean" }
                        },
                        "required": ["value", "appliedDiscount", "applicationSuccessful"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "coupons module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

/// Create the coupons module backed by an in-memory store
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(CouponsModule::new(Arc::new(MemoryCouponRepository::new())))
}
