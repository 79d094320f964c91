//! Database models for the Fish Trading Management Platform
//!
//! Re-exports models from the shared crate; row types specific to a query
//! live next to the service that runs it.

pub use shared::models::*;
