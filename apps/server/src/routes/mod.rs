//! # HTTP Routes
//!
//! Handlers grouped by resource. Each handler extracts its input, calls a
//! repository or the sales service, and returns JSON or an [`ApiError`].
//!
//! | Module | Paths |
//! |---|---|
//! | [`health`] | `/health` |
//! | [`category`] | `/api/categories`, `/api/categories/{id}` |
//! | [`product`] | `/api/products`, `/api/products/{id}` |
//! | [`sales`] | `/api/checkout`, `/api/transactions/{id}`, `/api/report/today`, `/api/report` |
//!
//! [`ApiError`]: crate::error::ApiError

pub mod category;
pub mod health;
pub mod product;
pub mod sales;

use serde::Serialize;

/// Body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
