//! Utility functions shared across layers.
//!
//! - [`url_normalizer`] - Validation of candidate image URLs

pub mod url_normalizer;
