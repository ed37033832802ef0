//! Filtering and aggregation of transactions for tables and charts.
//!
//! Everything here is a pure function of its input: nothing is cached,
//! nothing is mutated, and no function can fail. Buckets are rebuilt from
//! scratch on every call.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::format::{Locale, month_label};
use crate::models::{MonthKey, Transaction};

/// Composable filter over normalized transactions.
///
/// Every set criterion must match for a transaction to pass; an empty
/// filter matches everything.
///
/// # Examples
///
/// ```
/// use fintrack_rs::aggregate::TransactionFilter;
/// use fintrack_rs::models::NaiveDate;
///
/// let filter = TransactionFilter::new()
///     .date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     )
///     .category("Hospedaje")
///     .description("hotel");
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Start date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// End date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Exact, case-sensitive category name.
    pub category: Option<String>,
    /// Minimum signed amount (inclusive).
    pub min_amount: Option<f64>,
    /// Maximum signed amount (inclusive).
    pub max_amount: Option<f64>,
    /// Description substring (case-insensitive).
    pub description: Option<String>,
    /// Calendar month the transaction must fall in.
    pub month: Option<MonthKey>,
}

impl TransactionFilter {
    /// Creates an empty filter that matches all transactions.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to transactions within the given date range (inclusive).
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts to transactions on or after `from`.
    #[inline]
    #[must_use]
    pub const fn since(mut self, from: NaiveDate) -> Self {
        self.date_from = Some(from);
        self
    }

    /// Restricts to transactions on or before `to`.
    #[inline]
    #[must_use]
    pub const fn until(mut self, to: NaiveDate) -> Self {
        self.date_to = Some(to);
        self
    }

    /// Restricts to one category (exact match on the normalized name).
    #[inline]
    #[must_use]
    pub fn category<T: Into<String>>(mut self, name: T) -> Self {
        self.category = Some(name.into());
        self
    }

    /// Restricts to signed amounts in `[min, max]`.
    #[inline]
    #[must_use]
    pub const fn amount_range(mut self, min: f64, max: f64) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Restricts to signed amounts of at least `min`.
    #[inline]
    #[must_use]
    pub const fn min_amount(mut self, min: f64) -> Self {
        self.min_amount = Some(min);
        self
    }

    /// Restricts to signed amounts of at most `max`.
    #[inline]
    #[must_use]
    pub const fn max_amount(mut self, max: f64) -> Self {
        self.max_amount = Some(max);
        self
    }

    /// Restricts to descriptions containing `needle` (case-insensitive).
    #[inline]
    #[must_use]
    pub fn description<T: Into<String>>(mut self, needle: T) -> Self {
        self.description = Some(needle.into());
        self
    }

    /// Restricts to one calendar month.
    #[inline]
    #[must_use]
    pub const fn month(mut self, month: MonthKey) -> Self {
        self.month = Some(month);
        self
    }

    /// Returns `true` if no criterion is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if the transaction satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_date(tx)
            && self.matches_category(tx)
            && self.matches_amount(tx)
            && self.matches_description(tx)
            && self.month.is_none_or(|month| month.contains(tx.date))
    }

    /// Checks date range criteria.
    fn matches_date(&self, tx: &Transaction) -> bool {
        self.date_from.is_none_or(|from| tx.date >= from)
            && self.date_to.is_none_or(|to| tx.date <= to)
    }

    /// Checks category criteria.
    fn matches_category(&self, tx: &Transaction) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| *category == tx.category)
    }

    /// Checks amount criteria.
    fn matches_amount(&self, tx: &Transaction) -> bool {
        self.min_amount.is_none_or(|min| tx.amount >= min)
            && self.max_amount.is_none_or(|max| tx.amount <= max)
    }

    /// Checks description criteria.
    fn matches_description(&self, tx: &Transaction) -> bool {
        self.description.as_ref().is_none_or(|needle| {
            tx.description
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
    }
}

/// Running totals shared by month and category buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Sum of absolute values of negative amounts.
    pub expenses: f64,
    /// Sum of positive amounts.
    pub income: f64,
    /// Sum of all amounts.
    pub net: f64,
}

impl Totals {
    /// Accumulates one signed amount.
    fn add(&mut self, amount: f64) {
        if amount < 0.0_f64 {
            self.expenses += amount.abs();
        } else if amount > 0.0_f64 {
            self.income += amount;
        }
        self.net += amount;
    }
}

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    /// Month key (`YYYY-MM`).
    pub key: MonthKey,
    /// Localized label, e.g. `marzo de 2024`.
    pub label: String,
    /// Accumulated totals.
    pub totals: Totals,
}

/// Totals for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    /// Normalized category name.
    pub name: String,
    /// Accumulated totals.
    pub totals: Totals,
}

/// Scalar totals for the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    /// Sum of absolute values of negative amounts.
    pub total_expenses: f64,
    /// Sum of positive amounts.
    pub total_income: f64,
    /// `total_income - total_expenses`.
    pub balance: f64,
}

/// Returns the transactions matching `filter`, most recent first.
///
/// The sort is stable, so transactions on the same date keep their input
/// order. Filtering an already filtered list with the same filter returns
/// it unchanged.
#[inline]
#[must_use]
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    let mut matched: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| filter.matches(tx))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.date.cmp(&a.date));
    matched
}

/// Groups transactions by calendar month, oldest month first, with Spanish
/// labels.
#[inline]
#[must_use]
pub fn group_by_month(transactions: &[Transaction]) -> Vec<MonthBucket> {
    group_by_month_with_locale(transactions, Locale::default())
}

/// Groups transactions by calendar month, oldest month first.
#[inline]
#[must_use]
pub fn group_by_month_with_locale(transactions: &[Transaction], locale: Locale) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<MonthKey, Totals> = BTreeMap::new();
    for tx in transactions {
        buckets.entry(tx.month()).or_default().add(tx.amount);
    }
    buckets
        .into_iter()
        .map(|(key, totals)| MonthBucket {
            key,
            label: month_label(key, locale),
            totals,
        })
        .collect()
}

/// Groups transactions by category, largest spending first.
///
/// Categories with equal expenses are ordered by name.
#[inline]
#[must_use]
pub fn group_by_category(transactions: &[Transaction]) -> Vec<CategoryBucket> {
    let mut buckets: BTreeMap<&str, Totals> = BTreeMap::new();
    for tx in transactions {
        buckets.entry(tx.category.as_str()).or_default().add(tx.amount);
    }
    let mut out: Vec<CategoryBucket> = buckets
        .into_iter()
        .map(|(name, totals)| CategoryBucket {
            name: name.to_owned(),
            totals,
        })
        .collect();
    // Stable: name order survives among equal expenses.
    out.sort_by(|a, b| b.totals.expenses.total_cmp(&a.totals.expenses));
    out
}

/// Category buckets with any spending, for the expense pie chart.
#[inline]
#[must_use]
pub fn spending_by_category(transactions: &[Transaction]) -> Vec<CategoryBucket> {
    group_by_category(transactions)
        .into_iter()
        .filter(|bucket| bucket.totals.expenses > 0.0_f64)
        .collect()
}

/// Computes total income, total expenses and balance.
#[inline]
#[must_use]
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut totals = Totals::default();
    for tx in transactions {
        totals.add(tx.amount);
    }
    Summary {
        total_expenses: totals.expenses,
        total_income: totals.income,
        balance: totals.income - totals.expenses,
    }
}

/// Distinct months present in the list, most recent first.
#[inline]
#[must_use]
pub fn available_months(transactions: &[Transaction]) -> Vec<MonthKey> {
    let months: BTreeSet<MonthKey> = transactions.iter().map(Transaction::month).collect();
    months.into_iter().rev().collect()
}

/// Distinct category names in first-seen order.
#[inline]
#[must_use]
pub fn distinct_categories(transactions: &[Transaction]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    transactions
        .iter()
        .filter(|tx| seen.insert(tx.category.as_str()))
        .map(|tx| tx.category.clone())
        .collect()
}
