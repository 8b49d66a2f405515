//! Business services containing the token lifecycle logic.

pub mod device;
pub mod token;

// Re-export commonly used types
pub use device::{DeviceInfoResolver, RequestContext};
pub use token::{DeviceSessions, TokenService, TokenServiceConfig, TokenSigner};
