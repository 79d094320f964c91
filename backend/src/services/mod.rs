//! Business logic services for the Fish Trading Management Platform

pub mod lot;
pub mod sale;
pub mod stock;

pub use lot::LotService;
pub use sale::SaleService;
pub use stock::StockService;
