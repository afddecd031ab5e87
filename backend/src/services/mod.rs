//! Module for core business logic services.
//!
//! This module encapsulates services that sit between the HTTP handlers and
//! the store: validating transaction input and aggregating a user's
//! transactions into reports.

pub mod ledger;
pub mod reports;
