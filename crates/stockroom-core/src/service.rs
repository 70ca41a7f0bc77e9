//! # Sales Service
//!
//! The boundary the core exposes upward: checkout, transaction lookup and
//! the two summaries, wired to one store.

use std::time::Duration;

use tracing::debug;

use crate::checkout::CheckoutEngine;
use crate::error::{CoreError, CoreResult};
use crate::report::SalesAggregator;
use crate::store::{Clock, Store, TransactionStore};
use crate::types::{CheckoutItem, SalesSummary, Transaction};
use chrono::NaiveDate;

/// Checkout engine plus sales aggregator over a shared store.
///
/// `S` is cloned once per component, so it should be a cheap handle
/// (a pool, an `Arc`).
pub struct SalesService<S> {
    engine: CheckoutEngine<S>,
    aggregator: SalesAggregator<S>,
    store: S,
    checkout_timeout: Option<Duration>,
}

impl<S> SalesService<S>
where
    S: Store + TransactionStore + Clone,
{
    pub fn new(store: S) -> Self {
        SalesService {
            engine: CheckoutEngine::new(store.clone()),
            aggregator: SalesAggregator::new(store.clone()),
            store,
            checkout_timeout: None,
        }
    }

    /// Aborts checkouts that have not committed after `timeout`.
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = Some(timeout);
        self
    }

    /// Uses `clock` for both transaction timestamps and "today".
    pub fn with_clock(self, clock: Clock) -> Self {
        SalesService {
            engine: self.engine.with_clock(clock.clone()),
            aggregator: self.aggregator.with_clock(clock),
            ..self
        }
    }

    pub async fn checkout(&self, items: &[CheckoutItem]) -> CoreResult<Transaction> {
        match self.checkout_timeout {
            Some(timeout) => self.engine.checkout_within(items, timeout).await,
            None => self.engine.checkout(items).await,
        }
    }

    pub async fn get_transaction(&self, id: i64) -> CoreResult<Transaction> {
        debug!(transaction_id = id, "Looking up transaction");
        self.store
            .find_transaction(id)
            .await?
            .ok_or(CoreError::TransactionNotFound(id))
    }

    pub async fn today_summary(&self) -> CoreResult<SalesSummary> {
        self.aggregator.summary_for_today().await
    }

    pub async fn range_summary(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> CoreResult<SalesSummary> {
        self.aggregator.summary_for_range(start, end).await
    }
}
