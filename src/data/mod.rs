//! Data layer module
//!
//! Handles persistence of the quote collection:
//! - SQLite database operations
//! - Quote, theme and creation payload models

mod database;
mod models;

pub use database::Database;
pub use models::*;
