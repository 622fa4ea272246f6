//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates the request shape and delegates to the store or a service
//! 3. Returns an HTTP response (JSON, status code)

/// Account management endpoints
pub mod accounts;
/// Service health endpoint
pub mod health;
/// Transfer endpoints
pub mod transfers;
/// User management endpoints
pub mod users;
