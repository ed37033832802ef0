//! Data models for FinTrack API entities.
//!
//! Wire shapes mirror what the backend sends (tolerating its English and
//! Spanish field names); [`Transaction`] is the normalized record the
//! aggregation code works on.

mod auth;
mod ids;
mod month;
mod transaction;
mod upload;

pub use auth::{LoginResponse, Session, User, UserCreate};
pub use chrono::NaiveDate;
pub use ids::{TransactionId, UserId};
pub use month::MonthKey;
pub use transaction::{
    AmountField, CategoryField, RawTransaction, Transaction, TransactionInput, UNCATEGORIZED,
};
pub use upload::{ExtractedTransaction, PdfUploadResponse};
