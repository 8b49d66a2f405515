//! MySQL implementations of the core repository traits

pub mod refresh_token_repository_impl;

pub use refresh_token_repository_impl::MySqlRefreshTokenRepository;
