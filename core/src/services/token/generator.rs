//! Random identifiers handed out with every issuance

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// Entropy of a refresh token, in bytes (256 bits)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Opaque refresh token: OS randomness, base64url without padding
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Fresh `jti` for an access token
pub fn generate_jti() -> String {
    Uuid::new_v4().to_string()
}
