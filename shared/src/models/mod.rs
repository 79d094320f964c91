//! Domain models for the Fish Trading Management Platform

pub mod allocation;
pub mod lot;
pub mod sale;

pub use allocation::AllocationEntry;
pub use lot::PurchaseLot;
pub use sale::Sale;
