//! Database module - MySQL implementations using SQLx
//!
//! This module provides database access layer implementations including:
//! - Connection pool management
//! - The refresh-token repository
//! - Transaction support for issuance and rotation

pub mod connection;
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::MySqlRefreshTokenRepository;

/// Schema migrations for the refresh-token store
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
