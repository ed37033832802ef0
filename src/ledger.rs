//! Locally held transaction list with its active filter.
//!
//! A [`Ledger`] is what a page keeps between API calls: the last fetched
//! transactions, what normalization had to correct, and the filter the user
//! is looking through. Views are recomputed from it on demand.

use crate::aggregate::{
    self, CategoryBucket, MonthBucket, Summary, TransactionFilter, available_months,
    distinct_categories,
};
use crate::ingest::{self, IngestReport};
use crate::models::{MonthKey, RawTransaction, Transaction, TransactionId};

/// Token identifying one refresh request.
///
/// Obtained from [`Ledger::begin_refresh`] before issuing the request and
/// handed back to [`Ledger::complete_refresh`] with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Totals over all loaded transactions.
    pub summary: Summary,
    /// Monthly totals over the filtered transactions, oldest first.
    pub months: Vec<MonthBucket>,
    /// Category totals over the filtered transactions, largest spending first.
    pub categories: Vec<CategoryBucket>,
    /// Categories with any spending among the filtered transactions.
    pub spending: Vec<CategoryBucket>,
    /// Corrections made while loading.
    pub report: IngestReport,
}

/// Transaction list plus the filter applied to it.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    /// Normalized transactions in the order the API returned them.
    transactions: Vec<Transaction>,
    /// Corrections made by the last refresh.
    report: IngestReport,
    /// Active filter.
    filter: TransactionFilter,
    /// Ticket number of the most recent refresh request.
    generation: u64,
}

impl Ledger {
    /// Creates an empty ledger.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger from an API response.
    #[inline]
    #[must_use]
    pub fn from_raw(raws: Vec<RawTransaction>) -> Self {
        let mut ledger = Self::new();
        let ticket = ledger.begin_refresh();
        let _applied = ledger.complete_refresh(ticket, raws);
        ledger
    }

    /// Starts a refresh and returns its ticket.
    ///
    /// Any ticket issued earlier becomes stale.
    #[inline]
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation = self.generation.wrapping_add(1);
        RefreshTicket(self.generation)
    }

    /// Applies a refresh response if its ticket is still current.
    ///
    /// Returns `false`, leaving the ledger untouched, when a newer refresh
    /// was started after `ticket` was issued.
    #[inline]
    pub fn complete_refresh(&mut self, ticket: RefreshTicket, raws: Vec<RawTransaction>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale refresh response"
            );
            return false;
        }
        let (transactions, report) = ingest::normalize_all(raws);
        self.transactions = transactions;
        self.report = report;
        true
    }

    /// Inserts or replaces one transaction returned by a create/update call.
    ///
    /// New transactions go to the front of the list. Returns `false` if the
    /// record could not be normalized. [`Self::report`] is left as the last
    /// refresh produced it.
    #[inline]
    pub fn upsert(&mut self, raw: RawTransaction) -> bool {
        let mut scratch = IngestReport::default();
        let Some(tx) = ingest::normalize(raw, &mut scratch) else {
            return false;
        };
        if let Some(existing) = self.transactions.iter_mut().find(|t| t.id == tx.id) {
            *existing = tx;
        } else {
            self.transactions.insert(0, tx);
        }
        true
    }

    /// Removes a transaction after a successful delete. Returns `true` if it
    /// was present.
    #[inline]
    pub fn remove(&mut self, id: TransactionId) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|tx| tx.id != id);
        self.transactions.len() != before
    }

    /// Looks up a transaction by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// All loaded transactions, unfiltered, in API order.
    #[inline]
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Corrections made while loading.
    #[inline]
    #[must_use]
    pub const fn report(&self) -> IngestReport {
        self.report
    }

    /// Active filter.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> &TransactionFilter {
        &self.filter
    }

    /// Replaces the active filter.
    #[inline]
    pub fn set_filter(&mut self, filter: TransactionFilter) {
        self.filter = filter;
    }

    /// Selects a month tab, or all months with `None`.
    #[inline]
    pub const fn select_month(&mut self, month: Option<MonthKey>) {
        self.filter.month = month;
    }

    /// Transactions passing the active filter, most recent first.
    #[inline]
    #[must_use]
    pub fn visible(&self) -> Vec<Transaction> {
        aggregate::filter_transactions(&self.transactions, &self.filter)
    }

    /// Month tabs, most recent first.
    #[inline]
    #[must_use]
    pub fn months(&self) -> Vec<MonthKey> {
        available_months(&self.transactions)
    }

    /// Category choices for the filter.
    #[inline]
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        distinct_categories(&self.transactions)
    }

    /// Builds the dashboard view.
    ///
    /// The summary covers every loaded transaction; the month and category
    /// tables cover the filtered ones.
    #[inline]
    #[must_use]
    pub fn dashboard(&self) -> Dashboard {
        let visible = self.visible();
        Dashboard {
            summary: aggregate::summarize(&self.transactions),
            months: aggregate::group_by_month(&visible),
            categories: aggregate::group_by_category(&visible),
            spending: aggregate::spending_by_category(&visible),
            report: self.report,
        }
    }
}
