//! # Stockroom Server
//!
//! JSON over HTTP in front of the checkout engine, the sales aggregator and
//! the category/product repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Server                                 │
//! │                                                                         │
//! │  Client ──► axum Router ──► routes::* ──► SalesService ──► SQLite       │
//! │                 │                │                                      │
//! │                 │                └──────► db.categories() / products()  │
//! │                 ▼                                                       │
//! │             AppState { db, sales }                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `ApiError` and status mapping
//! - [`extract`] - `Json`/`Path`/`Query` wrappers rejecting with `ApiError`
//! - [`routes`] - Handlers grouped by resource

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

use stockroom_core::SalesService;
use stockroom_db::Database;

/// Shared application state.
///
/// Cloned into every handler; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sales: Arc<SalesService<Database>>,
}

impl AppState {
    /// Wires the sales service to `db`.
    pub fn new(db: Database, checkout_timeout: Option<Duration>) -> Self {
        let mut sales = SalesService::new(db.clone());
        if let Some(timeout) = checkout_timeout {
            sales = sales.with_checkout_timeout(timeout);
        }

        AppState {
            db,
            sales: Arc::new(sales),
        }
    }
}

/// Builds the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/categories",
            get(routes::category::list).post(routes::category::create),
        )
        .route(
            "/api/categories/{id}",
            get(routes::category::get)
                .put(routes::category::update)
                .delete(routes::category::delete),
        )
        .route(
            "/api/products",
            get(routes::product::list).post(routes::product::create),
        )
        .route(
            "/api/products/{id}",
            get(routes::product::get)
                .put(routes::product::update)
                .delete(routes::product::delete),
        )
        .route("/api/checkout", post(routes::sales::checkout))
        .route("/api/transactions/{id}", get(routes::sales::get_transaction))
        .route("/api/report/today", get(routes::sales::today_summary))
        .route("/api/report", get(routes::sales::range_summary))
        .with_state(state)
}

// =============================================================================
// Tests
// =============================================================================
