//! Mapping from gatekeeping errors to HTTP responses

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use thiserror::Error;

use shelf_core::errors::{DomainError, SessionError};
use shelf_shared::error_codes;

use crate::dto::{ErrorResponse, ErrorResponseExt};

/// Error type returned across the HTTP boundary.
///
/// Wraps a [`DomainError`] so handlers and middleware can use `?` and still
/// produce the shared JSON error body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] DomainError);

impl ApiError {
    pub fn domain(&self) -> &DomainError {
        &self.0
    }

    fn body(&self) -> ErrorResponse {
        match &self.0 {
            DomainError::RateLimited {
                retry_after_seconds,
            } => {
                let body = ErrorResponse::new(
                    error_codes::RATE_LIMIT_EXCEEDED,
                    "Too many requests. Please slow down",
                );
                match retry_after_seconds {
                    Some(seconds) => body.add_detail("retry_after_seconds", seconds),
                    None => body,
                }
            }
            DomainError::Unauthenticated => {
                ErrorResponse::new(error_codes::UNAUTHENTICATED, "Authentication required")
            }
            // One message for every credential failure
            DomainError::InvalidCredential(_) => {
                ErrorResponse::new(error_codes::INVALID_SESSION, "Invalid session")
            }
            DomainError::Configuration { .. } | DomainError::Internal { .. } => {
                ErrorResponse::new(
                    error_codes::INTERNAL_ERROR,
                    "An internal server error occurred",
                )
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(DomainError::from(err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            DomainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            DomainError::Unauthenticated | DomainError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::Configuration { .. } | DomainError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let mut response = self.body().to_response(self.status_code());
        if let DomainError::RateLimited {
            retry_after_seconds: Some(seconds),
        } = &self.0
        {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                header::HeaderValue::from(*seconds),
            );
        }
        response
    }
}
