//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types exchanged with API clients.

/// Bank account model
pub mod account;
/// API key authentication model
pub mod api_key;
/// Ledger entry model
pub mod entry;
/// Transfer record model
pub mod transfer;
/// Bank customer model
pub mod user;
