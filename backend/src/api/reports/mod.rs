//! Module for the reports API.
//!
//! This module exposes the dashboard, monthly and yearly summaries and the
//! CSV export of the signed-in user's transactions.

pub mod handlers;
pub mod routes;
