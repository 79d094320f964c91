//! HTTP handlers for the Fish Trading Management Platform

pub mod lots;
pub mod sales;
pub mod stock;

pub use lots::*;
pub use sales::*;
pub use stock::*;
