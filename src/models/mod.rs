//! Data models for stored records and admin API bodies.
//!
//! These structs map to the JSON kept in the key-value store. Wire names
//! are camelCase to match the stored layout.

/// API key credential model
pub mod api_key;
/// Client (billable tenant) model
pub mod client;
/// Credit balance and debit outcome models
pub mod credits;
/// Routing target model
pub mod target;
