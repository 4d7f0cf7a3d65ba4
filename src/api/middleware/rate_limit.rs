//! Per-client rate limiting using the token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Creates a rate limiter for the public endpoints.
///
/// Each client IP (socket peer address) gets a bucket refilled at
/// `per_second` tokens per second holding at most `burst` tokens. Requests
/// exceeding the limit receive `429 Too Many Requests`.
///
/// Both values are validated as non-zero by [`crate::config::Config::validate`].
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", get(random_image_handler))
///     .layer(rate_limit::layer(10, 200));
/// ```
pub fn layer(
    per_second: u64,
    burst: u32,
) -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second.max(1))
            .burst_size(burst.max(1))
            .finish()
            .expect("non-zero rate limit configuration"),
    );

    GovernorLayer::new(governor_conf)
}
