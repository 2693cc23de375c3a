use std::fmt::{Display, Formatter};

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::multipart::MultipartError;
use pdf_excel_core::ConvertError;

use crate::models::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    EmptyContent(String),
    NotFound(String),
    Processing(String),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::EmptyContent(_) => "empty_content",
            Self::NotFound(_) => "not_found",
            Self::Processing(_) => "processing_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(message)
            | Self::BadRequest(message)
            | Self::EmptyContent(message)
            | Self::NotFound(message)
            | Self::Processing(message)
            | Self::Internal(message) => message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::EmptyContent(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Processing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a pipeline failure, keeping "nothing to extract" apart from
    /// genuine processing errors.
    pub fn from_conversion(context: &str, error: &ConvertError) -> Self {
        if error.is_empty_content() {
            Self::EmptyContent(
                "No tables or text found in PDF. The PDF might be image-based or empty."
                    .to_string(),
            )
        } else {
            Self::Processing(format!("{context}: {error}"))
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            code: self.code().to_string(),
            message: self.message().to_string(),
        });
        (
            self.status_code(),
            [(header::CACHE_CONTROL, "no-store")],
            body,
        )
            .into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        Self::BadRequest(format!("invalid multipart upload: {error}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal(format!("conversion task failed: {error}"))
    }
}

impl From<axum::http::Error> for ApiError {
    fn from(error: axum::http::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
