//! Image URL validation and normalization.
//!
//! Listing entries come from an upstream we do not control, so every
//! candidate is parsed before it may enter the pool.

use url::Url;

/// Errors that can occur while validating an image URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URLs with embedded credentials are not allowed")]
    EmbeddedCredentials,
}

/// Normalizes a candidate image URL to its canonical form.
///
/// # Normalization Rules
///
/// 1. **Protocol**: Only HTTP and HTTPS are allowed
/// 2. **Host**: Required, lowercased by the parser
/// 3. **Default ports**: Removed by the parser
/// 4. **Fragments**: Removed
/// 5. **Credentials**: Rejected
///
/// # Errors
///
/// Returns an [`UrlNormalizationError`] describing the first rule violated.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_image_url("HTTPS://I.EXAMPLE.COM:443/img/1.jpg#x").unwrap(),
///     "https://i.example.com/img/1.jpg"
/// );
/// ```
pub fn normalize_image_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url = Url::parse(input.trim())
        .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(UrlNormalizationError::EmbeddedCredentials);
    }

    url.set_fragment(None);

    Ok(url.to_string())
}
