//! HTTP middleware components.
//!
//! Middleware run before route handlers to authenticate admin calls
//! and to stamp every request with a correlation id.

/// Admin key authentication middleware
pub mod admin_auth;
/// Request correlation id layers
pub mod request_id;
