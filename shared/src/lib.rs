//! Shared types and domain logic for the Fish Trading Management Platform
//!
//! This crate contains the persistence-free core: domain models, the lot
//! ledger projection, and the FIFO allocation planner. The backend wires
//! these into Postgres transactions; everything here is testable against
//! in-memory fixtures.

pub mod allocation;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
