//! HTTP request handlers.

pub mod health;
pub mod random_image;

pub use health::health_handler;
pub use random_image::random_image_handler;
