//! Multi-vendor marketplace service
//!
//! Merchants list products under categories; shoppers browse and build a
//! session-backed cart that is checked against live stock.
//!
//! ## Features
//! - Product catalog scoped by merchant and category
//! - Active/inactive product visibility
//! - Session carts gated on inventory
//! - Product events over NATS

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod services;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use http::{build_router, AppState};
