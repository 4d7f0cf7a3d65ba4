//! Request-level errors and their HTTP representation.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Errors that end a request with a plain-text response.
///
/// Origin and listing failures never reach this type: they degrade to the
/// fallback image inside the handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No key-value store is bound; the pool cannot be read at all.
    #[error("Error: KV store binding not found.")]
    StoreUnavailable,

    /// Anything unexpected on the request path.
    #[error("Server Error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::StoreUnavailable | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        tracing::error!("Request failed: {}", self);

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_store_unavailable_response() {
        let response = AppError::StoreUnavailable.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "Error: KV store binding not found.");
    }

    #[tokio::test]
    async fn test_internal_response_carries_message() {
        let response = AppError::internal("boom").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Server Error: boom");
    }
}
