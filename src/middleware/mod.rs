//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can authenticate requests,
//! attach context, or short-circuit unauthorized requests.

/// API key authentication middleware
pub mod auth;
