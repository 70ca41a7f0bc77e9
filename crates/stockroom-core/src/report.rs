//! # Sales Aggregator
//!
//! Revenue, transaction count and best seller over a window of calendar
//! days (UTC, inclusive on both ends).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  summary_for_today()            summary_for_range(start, end)           │
//! │        │ today = clock (UTC)          │ both required, start <= end     │
//! │        └──────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │       aggregate_revenue_and_count(from, to) ──► revenue, count          │
//! │       aggregate_best_seller(from, to)       ──► Option<best seller>     │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │                  SalesSummary                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tracing::debug;

use crate::error::CoreResult;
use crate::store::{system_clock, Clock, TransactionStore};
use crate::types::SalesSummary;
use crate::validation::validate_date_range;

/// Read-only sales summaries. Safe to run concurrently with checkouts.
pub struct SalesAggregator<R> {
    store: R,
    clock: Clock,
}

impl<R: TransactionStore> SalesAggregator<R> {
    pub fn new(store: R) -> Self {
        SalesAggregator {
            store,
            clock: system_clock(),
        }
    }

    /// Replaces the clock used to decide what "today" is.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Summary of the current UTC day.
    pub async fn summary_for_today(&self) -> CoreResult<SalesSummary> {
        let today = (self.clock)().date_naive();
        self.summarize(today, today).await
    }

    /// Summary of an inclusive date range.
    ///
    /// ## Errors
    /// `Validation` when either end is missing or `start` is after `end`.
    pub async fn summary_for_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CoreResult<SalesSummary> {
        let (start, end) = validate_date_range(start, end)?;
        self.summarize(start, end).await
    }

    async fn summarize(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<SalesSummary> {
        let totals = self.store.aggregate_revenue_and_count(from, to).await?;
        let best_selling_product = self.store.aggregate_best_seller(from, to).await?;

        debug!(
            %from,
            %to,
            revenue_cents = totals.revenue_cents,
            transactions = totals.transaction_count,
            "Sales summarized"
        );

        Ok(SalesSummary {
            total_revenue_cents: totals.revenue_cents,
            total_transactions: totals.transaction_count,
            best_selling_product,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
