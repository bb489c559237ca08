//! Shared types and models for the Poultry Farm Management Platform
//!
//! This crate contains the domain model and the pure bookkeeping logic shared
//! between the backend, the browser forms (via WASM), and the test suites.

pub mod ledger;
pub mod models;
pub mod pricing;
pub mod reports;
pub mod schedule;
pub mod types;
pub mod validation;

pub use ledger::{BalanceEffect, BalancePolicy, LedgerError};
pub use models::*;
pub use types::*;
pub use validation::*;
