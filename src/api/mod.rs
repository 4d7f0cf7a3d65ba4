//! HTTP layer: handlers, response assembly, DTOs and middleware.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for JSON responses
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Rate limiting, panic recovery and tracing middleware
//! - [`response`] - Client-facing image and fallback responses

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod response;
