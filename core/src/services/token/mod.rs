//! Token service module
//!
//! - Access-token signing and validation (`TokenSigner`)
//! - Refresh-token issuance, single-use rotation and revocation (`TokenService`)
//! - Device-session listing (`DeviceSessions`)
//! - On-demand removal of stale records

mod config;
mod generator;
mod service;
mod sessions;
mod signer;

#[cfg(test)]
mod tests;

pub use config::TokenServiceConfig;
pub use generator::{generate_jti, generate_refresh_token, REFRESH_TOKEN_BYTES};
pub use service::TokenService;
pub use sessions::DeviceSessions;
pub use signer::TokenSigner;
