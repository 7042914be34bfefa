//! Mercuriale ingestion and offer price verification.
//!
//! Free-text market price survey lines are parsed into structured records,
//! item descriptions are resolved to canonical dictionary items by exact
//! matching, and submitted offer prices are classified against mean
//! historical reference prices. Outputs are descriptive; nothing here ranks
//! or selects offers.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, PgStore};
pub use error::{CoreError, Result};
pub use logging::init_tracing;
pub use service::MercurialeService;
