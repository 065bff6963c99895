//! Job marketplace domain: wire types, filters, the REST client and the
//! cached stores built on top of it.

mod cache;
pub mod client;
pub mod filters;
pub mod stores;
pub mod types;

pub use client::MarketplaceClient;
