mod signer_tests;

use std::sync::Arc;

use crate::domain::entities::user::User;
use crate::repositories::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
use crate::services::token::{TokenService, TokenServiceConfig};

pub(super) type MemoryTokenService =
    TokenService<InMemoryRefreshTokenRepository, InMemoryUserRepository, InMemoryUserRepository>;

pub(super) struct Fixture {
    pub service: MemoryTokenService,
    pub tokens: Arc<InMemoryRefreshTokenRepository>,
    pub users: Arc<InMemoryUserRepository>,
}

pub(super) fn test_config() -> TokenServiceConfig {
    TokenServiceConfig {
        jwt_secret: "test-secret-with-enough-length-for-hmac".to_string(),
        ..Default::default()
    }
}

pub(super) async fn fixture() -> Fixture {
    let tokens = Arc::new(InMemoryRefreshTokenRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    users.insert(User::new("u1", "alice"), ["Admin", "User"]).await;
    users.insert(User::new("u2", "bob"), ["User"]).await;

    let service = TokenService::new(tokens.clone(), users.clone(), users.clone(), test_config())
        .expect("Failed to create token service");

    Fixture {
        service,
        tokens,
        users,
    }
}

pub(super) fn alice() -> User {
    User::new("u1", "alice")
}
