use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::Error;

/// Failures an HTTP request can end in.
#[derive(Debug)]
pub enum ApiError {
    MissingFile,
    BadUpload(String),
    InvalidMethod(String),
    Convert(Error),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Convert(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::BadUpload(_) | ApiError::InvalidMethod(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Convert(e) => match e {
                Error::UnsupportedFormat(_)
                | Error::UnsupportedMethodForFormat { .. }
                | Error::InvalidContainer(_) => StatusCode::BAD_REQUEST,
                Error::SectionParseError { .. }
                | Error::NestingTooDeep { .. }
                | Error::MalformedHeader(_)
                | Error::UnsupportedVersion(_)
                | Error::Zip(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::ExternalToolTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                Error::ExternalToolFailure { .. } => StatusCode::BAD_GATEWAY,
                Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "missing_file",
            ApiError::BadUpload(_) => "bad_upload",
            ApiError::InvalidMethod(_) => "invalid_method",
            ApiError::Convert(e) => e.kind(),
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::MissingFile => "multipart field 'file' is required".to_string(),
            ApiError::BadUpload(message) | ApiError::Internal(message) => message.clone(),
            ApiError::InvalidMethod(detail) => {
                format!("method must be one of auto, hwpx-native, pyhwp, libreoffice ({detail})")
            }
            ApiError::Convert(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}: {}", self.kind(), self.message());
        } else {
            log::info!("Rejected request: {}: {}", self.kind(), self.message());
        }
        let body = Json(ErrorBody {
            error: self.kind(),
            message: self.message(),
        });
        (status, body).into_response()
    }
}
