//! Module for the transactions API.
//!
//! This module exposes listing, creation, editing and deletion of the
//! signed-in user's income and expense records.

pub mod handlers;
pub mod routes;
