//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Pool`] - The refreshed list of candidate image URLs
//! - [`OriginImage`] - An image response straight from the origin
//! - [`CachedImage`] - An image retained by the edge cache

pub mod cached_image;
pub mod pool;

pub use cached_image::{CachedImage, OriginImage};
pub use pool::Pool;
