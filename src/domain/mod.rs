//! Domain layer containing the core entities.
//!
//! # Architecture
//!
//! - [`entities`] - Pool and image payload data structures
//!
//! This layer depends on nothing else in the crate.

pub mod entities;
