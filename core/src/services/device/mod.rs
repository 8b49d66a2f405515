//! Device metadata derived from request context

pub mod resolver;

pub use resolver::{DeviceInfoResolver, RequestContext, MAX_FIELD_LENGTH};
