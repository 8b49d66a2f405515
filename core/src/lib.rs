//! # Session Guard Core
//!
//! Domain layer for session-credential lifecycle management: access-token
//! signing and validation, single-use refresh-token rotation, revocation,
//! and per-device session listing.
//!
//! Storage is abstracted behind [`repositories::RefreshTokenRepository`];
//! in-memory implementations ship with the crate for tests and embedding.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    Claims, DeviceInfo, DeviceSession, RefreshToken, RevocationReason, TokenBundle, User,
};
pub use errors::{AuthError, DomainError, DomainResult, TokenError};
pub use repositories::{
    InMemoryRefreshTokenRepository, InMemoryUserRepository, RefreshTokenRepository,
    RoleRepository, UserRepository,
};
pub use services::{
    DeviceInfoResolver, DeviceSessions, RequestContext, TokenService, TokenServiceConfig,
    TokenSigner,
};
