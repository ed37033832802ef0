//! Transaction models: the canonical record and its wire shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MonthKey, TransactionId, UserId};

/// Category name used when a transaction carries no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A normalized transaction, ready for aggregation.
///
/// Produced by [`crate::ingest`] from a [`RawTransaction`]. The sign of
/// `amount` decides whether the record is an expense (negative) or income
/// (positive); nothing else is consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Backend identifier.
    pub id: TransactionId,
    /// Posting date.
    pub date: NaiveDate,
    /// Free-text label.
    pub description: String,
    /// Signed amount in Mexican pesos.
    pub amount: f64,
    /// Category name, [`UNCATEGORIZED`] when the backend had none.
    pub category: String,
}

impl Transaction {
    /// Returns `true` for charges (negative amounts).
    #[inline]
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0_f64
    }

    /// Returns `true` for credits (positive amounts).
    #[inline]
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.amount > 0.0_f64
    }

    /// Month the transaction posted in.
    #[inline]
    #[must_use]
    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }
}

/// Amount as sent by the backend: usually a number, sometimes a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    /// JSON number.
    Number(f64),
    /// Text such as `"-1,250.00"` or `"$ 89.90"`.
    Text(String),
}

/// Category as sent by the backend.
///
/// Some endpoints return a bare name, others a `{id, name}` (or Spanish
/// `{id, nombre}`) reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    /// Plain category name.
    Name(String),
    /// Category reference object.
    Reference {
        /// Category identifier, when present.
        #[serde(default)]
        id: Option<i64>,
        /// Category name.
        #[serde(alias = "nombre")]
        name: String,
    },
}

impl CategoryField {
    /// Returns the trimmed category name, or `None` if it is blank.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let raw = match *self {
            Self::Name(ref name) | Self::Reference { ref name, .. } => name.trim(),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

/// A transaction exactly as the list endpoint returns it.
///
/// Field names are accepted in English or Spanish, and every field other
/// than `id` may be absent or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Backend identifier.
    pub id: TransactionId,
    /// Posting date, as text.
    #[serde(default, alias = "fecha")]
    pub date: Option<String>,
    /// Free-text label.
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    /// Signed amount.
    #[serde(default, alias = "monto")]
    pub amount: Option<AmountField>,
    /// Category name or reference.
    #[serde(default, alias = "categoria")]
    pub category: Option<CategoryField>,
    /// Owning user.
    #[serde(default, alias = "usuario_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Server-side creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Posting date.
    pub date: NaiveDate,
    /// Free-text label.
    pub description: String,
    /// Signed amount.
    pub amount: f64,
    /// Category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
