use crate::config::ConfigError;
use crate::scan::ScanError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Problems with the uploaded multipart payload, before decoding starts.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no image uploaded; send a multipart field named 'image'")]
    MissingImage,
    #[error("invalid file type '{filename}'; use JPG/PNG/GIF/BMP/TIFF")]
    UnsupportedType { filename: String },
    #[error("upload could not be read: {0}")]
    Unreadable(String),
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Upload(UploadError),
    Scan(ScanError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Upload(err) => write!(f, "{}", err),
            AppError::Scan(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Upload(err) => Some(err),
            AppError::Scan(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // User-correctable problems are 400s with an actionable message;
        // internal breakage stays a 500.
        let status = match &self {
            AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::Scan(ScanError::NoBarcodeDetected)
            | AppError::Scan(ScanError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
            AppError::Scan(ScanError::Processing(_))
            | AppError::Scan(ScanError::InvalidProduct(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<UploadError> for AppError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

impl From<ScanError> for AppError {
    fn from(value: ScanError) -> Self {
        Self::Scan(value)
    }
}
