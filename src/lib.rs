//! Rust client library for the FinTrack personal finance backend.
//!
//! This crate provides a typed client for the FinTrack REST API (accounts,
//! transactions and bank statement uploads) together with the local
//! aggregation the dashboard is built from: filtering, monthly and
//! per-category totals, and an overall balance summary.
//!
//! The aggregation layer is pure and synchronous; feed it transactions
//! normalized by [`ingest`], or keep them in a [`ledger::Ledger`].

pub mod aggregate;
pub mod categorize;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod error;
pub mod format;
pub mod ingest;
pub mod ledger;
pub mod models;
#[cfg(feature = "session-file")]
pub mod session;
