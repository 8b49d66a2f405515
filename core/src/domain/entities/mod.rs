//! Domain entities for issued credentials, devices and users.

pub mod device;
pub mod token;
pub mod user;

pub use device::{DeviceInfo, DeviceSession};
pub use token::{Claims, RefreshToken, RevocationReason, TokenBundle, TOKEN_TYPE_BEARER};
pub use user::User;
