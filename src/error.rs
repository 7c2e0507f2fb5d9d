use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Principal/password mismatch. One uniform variant whether or not the
    /// principal exists, so login failures are not enumerable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The session token's expiry has passed.
    #[error("Token expired")]
    TokenExpired,

    /// Signature, structure, issuer, or audience mismatch.
    #[error("Token invalid")]
    TokenInvalid,

    /// Any other token parse failure.
    #[error("Token verification failed")]
    TokenVerificationFailed,

    /// The caller is authenticated but lacks the required role.
    #[error("Authorization failed")]
    Forbidden,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Login rejected: invalid credentials");
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid work id or password".to_string(),
                )
            }

            AppError::TokenExpired => {
                tracing::warn!("Token rejected: expired");
                (StatusCode::UNAUTHORIZED, "Token expired".to_string())
            }

            AppError::TokenInvalid => {
                tracing::warn!("Token rejected: invalid");
                (StatusCode::UNAUTHORIZED, "Token invalid".to_string())
            }

            AppError::TokenVerificationFailed => {
                tracing::warn!("Token rejected: verification failed");
                (
                    StatusCode::UNAUTHORIZED,
                    "Token verification failed".to_string(),
                )
            }

            AppError::Forbidden => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "success": false,
            "message": message
        }))
        .unwrap_or_else(|_| r#"{"success":false,"message":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
