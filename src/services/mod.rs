//! Core gateway services.
//!
//! Each stage of the request pipeline lives in its own service:
//! validation, routing, credit accounting, usage telemetry, and
//! forwarding. Handlers compose them; the services never touch HTTP
//! extraction themselves.

/// Credit ledger with per-client debit serialization
pub mod credits;
/// Outbound request building and response relay
pub mod proxy;
/// Static routing table and path matching
pub mod targets;
/// Fire-and-forget daily usage counters
pub mod usage;
/// API key validation with TTL cache
pub mod validator;
