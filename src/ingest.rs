//! Normalization of API payloads into [`Transaction`] records.
//!
//! The list endpoint is loose about types: dates come in several formats,
//! amounts may be strings, categories may be names or objects. Everything is
//! coerced here, once, so the aggregation code never has to branch on shape.
//!
//! Records are corrected rather than rejected where possible:
//!
//! - an unparseable **date** drops the record (it cannot be placed in a
//!   month) and bumps [`IngestReport::skipped_dates`];
//! - an unparseable **amount** becomes `0.0` and bumps
//!   [`IngestReport::zeroed_amounts`];
//! - a missing or blank **category** becomes [`UNCATEGORIZED`].

use chrono::{DateTime, NaiveDate};

use crate::models::{AmountField, CategoryField, RawTransaction, Transaction, UNCATEGORIZED};

/// Date formats tried in order after the ISO prefix check.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Counters describing what normalization had to correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records turned into transactions.
    pub accepted: usize,
    /// Records dropped because their date could not be parsed.
    pub skipped_dates: usize,
    /// Accepted records whose amount was replaced by zero.
    pub zeroed_amounts: usize,
}

impl IngestReport {
    /// Returns `true` if any record was dropped or altered.
    #[inline]
    #[must_use]
    pub const fn has_corrections(&self) -> bool {
        self.skipped_dates > 0 || self.zeroed_amounts > 0
    }
}

/// Parses a date in any format the backend or the statement extractor is
/// known to produce.
///
/// Accepts `YYYY-MM-DD`, any ISO 8601 / RFC 3339 timestamp (the date part is
/// kept as written), `DD-Mon-YYYY` with English month abbreviations,
/// `DD/MM/YYYY` and `DD-MM-YYYY`.
#[inline]
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Some(prefix) = trimmed.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Parses an amount, returning `None` for anything that is not a finite
/// number.
///
/// Text amounts are stripped of currency symbols, spaces and thousands
/// separators, so `"$1,234.50"` parses as `1234.5`. A decimal comma
/// (`"1.234,50"`), the Unicode minus sign and accounting parentheses
/// (`"(120.00)"`) are understood.
#[inline]
#[must_use]
pub fn parse_amount(field: &AmountField) -> Option<f64> {
    let value = match *field {
        AmountField::Number(number) => number,
        AmountField::Text(ref text) => parse_amount_text(text)?,
    };
    value.is_finite().then_some(value)
}

/// Parses a text amount; see [`parse_amount`].
fn parse_amount_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let parenthesized = trimmed.starts_with('(') && trimmed.ends_with(')');
    let comma_decimal = has_decimal_comma(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter_map(|ch| match ch {
            '0'..='9' | '-' => Some(ch),
            '\u{2212}' => Some('-'),
            '.' => (!comma_decimal).then_some('.'),
            ',' => comma_decimal.then_some('.'),
            _ => None,
        })
        .collect();
    let value = cleaned.parse::<f64>().ok()?;
    Some(if parenthesized { -value.abs() } else { value })
}

/// Returns `true` when the last comma is followed by one or two digits and
/// no dot, as in `1.234,50` or `12,5`.
fn has_decimal_comma(text: &str) -> bool {
    text.rsplit_once(',').is_some_and(|(_, tail)| {
        let digits = tail.chars().take_while(char::is_ascii_digit).count();
        matches!(digits, 1 | 2) && !tail.contains('.')
    })
}

/// Returns the canonical category name for an optional wire category.
#[inline]
#[must_use]
pub fn category_name(field: Option<&CategoryField>) -> String {
    field
        .and_then(CategoryField::name)
        .unwrap_or(UNCATEGORIZED)
        .to_owned()
}

/// Normalizes one record, updating `report`.
///
/// Returns `None` when the record had to be dropped.
#[inline]
pub fn normalize(raw: RawTransaction, report: &mut IngestReport) -> Option<Transaction> {
    let Some(date) = raw.date.as_deref().and_then(parse_date) else {
        report.skipped_dates += 1;
        tracing::warn!(id = %raw.id, date = ?raw.date, "dropping transaction with unparseable date");
        return None;
    };

    let amount = match raw.amount.as_ref().and_then(parse_amount) {
        Some(amount) => amount,
        None => {
            report.zeroed_amounts += 1;
            tracing::warn!(id = %raw.id, amount = ?raw.amount, "unparseable amount replaced by zero");
            0.0
        }
    };

    report.accepted += 1;
    Some(Transaction {
        id: raw.id,
        date,
        description: raw.description.unwrap_or_default(),
        amount,
        category: category_name(raw.category.as_ref()),
    })
}

/// Normalizes a whole response, preserving order.
#[inline]
pub fn normalize_all<I>(raws: I) -> (Vec<Transaction>, IngestReport)
where
    I: IntoIterator<Item = RawTransaction>,
{
    let mut report = IngestReport::default();
    let transactions = raws
        .into_iter()
        .filter_map(|raw| normalize(raw, &mut report))
        .collect();
    tracing::debug!(
        accepted = report.accepted,
        skipped_dates = report.skipped_dates,
        zeroed_amounts = report.zeroed_amounts,
        "normalized transactions"
    );
    (transactions, report)
}
