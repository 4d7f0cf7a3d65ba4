//! Upstream listing endpoint and image origin.

mod http_origin;
mod service;

pub use http_origin::{HttpOrigin, OriginSettings};
pub use service::{ImageOrigin, OriginError};

#[cfg(test)]
pub use service::MockImageOrigin;
