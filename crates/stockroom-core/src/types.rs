//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Category     │1 N│    Product      │   │    Transaction      │   │
//! │  │  ─────────────  │──►│  ─────────────  │   │  ─────────────────  │   │
//! │  │  id             │   │  id             │   │  id                 │   │
//! │  │  name (unique)  │   │  name           │   │  total_cents        │   │
//! │  │  description    │   │  price_cents    │   │  created_at (UTC)   │   │
//! │  └─────────────────┘   │  stock          │   └──────────┬──────────┘   │
//! │                        │  category_id    │              │ 1:N cascade  │
//! │                        └────────▲────────┘              ▼              │
//! │                                 │ non-owning  ┌─────────────────────┐   │
//! │                                 └─────────────│ TransactionDetail   │   │
//! │                                               │  quantity           │   │
//! │                                               │  subtotal_cents     │   │
//! │                                               └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has a store-assigned integer id. Ids are never reused and
//! never change after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A grouping of products (e.g. "Beverages").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,

    /// Unique display name, at most 100 characters.
    pub name: String,

    pub description: String,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Partial category update. Missing or empty fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name, at most 200 characters.
    pub name: String,

    /// Unit price in cents. Never negative.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category_id: i64,

    /// Owning category, populated by lookups that join it.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from the current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: i64,
}

/// Partial product update. `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed checkout. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,

    /// Sum of the line subtotals, in cents.
    pub total_cents: i64,

    /// Assigned inside the committing unit of work.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Line items, populated when the transaction is loaded with details.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
}

impl Transaction {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Transaction Detail
// =============================================================================

/// A line item of a transaction.
/// The subtotal is frozen at the time of sale and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionDetail {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    /// Quantity sold, always positive.
    pub quantity: i64,
    /// Unit price × quantity at time of sale (frozen).
    pub subtotal_cents: i64,

    /// The product as it was read during checkout, or as currently stored
    /// when the transaction is looked up later.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl TransactionDetail {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One line of a checkout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
}

impl CheckoutItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        CheckoutItem {
            product_id,
            quantity,
        }
    }
}

/// Ordered list of lines to sell in one atomic unit.
/// Duplicate product ids are independent lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

// =============================================================================
// Sales Summary
// =============================================================================

/// The product sold the most units within a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BestSellingProduct {
    pub product_id: i64,
    pub name: String,
    pub qty_sold: i64,
}

/// Revenue and count over a window, as returned by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RevenueAndCount {
    pub revenue_cents: i64,
    pub transaction_count: i64,
}

/// Derived projection over a date window. Recomputed on every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub total_revenue_cents: i64,
    pub total_transactions: i64,
    pub best_selling_product: Option<BestSellingProduct>,
}

impl SalesSummary {
    /// Returns the revenue as Money.
    #[inline]
    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
