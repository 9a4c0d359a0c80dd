//! # ApiError
//!
//! Maps the domain taxonomy onto HTTP. Each failure gets a status, a stable
//! machine code and a short message; the underlying detail is logged and
//! never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request body could not be read as the expected JSON.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// A known template whose preview raster is missing.
    #[error("preview unavailable: {0}")]
    PreviewUnavailable(DomainError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PreviewUnavailable(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::UnknownTemplate(_) => StatusCode::NOT_FOUND,
                DomainError::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::LedgerContention { .. } => StatusCode::CONFLICT,
                DomainError::DirectoryUnavailable { .. } => StatusCode::BAD_GATEWAY,
                DomainError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::TemplateLoad { .. }
                | DomainError::FontLoad(_)
                | DomainError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::PreviewUnavailable(_) => "TEMPLATE_LOAD_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) => "VALIDATION_ERROR",
                DomainError::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
                DomainError::Encoding(_) => "ENCODING_ERROR",
                DomainError::LedgerContention { .. } => "LEDGER_CONTENTION",
                DomainError::DirectoryUnavailable { .. } => "DIRECTORY_UNAVAILABLE",
                DomainError::Storage(_) => "LEDGER_UNAVAILABLE",
                DomainError::TemplateLoad { .. } => "TEMPLATE_LOAD_ERROR",
                DomainError::FontLoad(_) => "FONT_LOAD_ERROR",
                DomainError::Render(_) => "RENDER_ERROR",
            },
        }
    }

    /// What the operator sees.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::PreviewUnavailable(DomainError::TemplateLoad { code, .. }) => {
                format!("No preview is available for template {code}.")
            }
            ApiError::PreviewUnavailable(_) => "No preview is available.".to_string(),
            ApiError::Internal(_) => "An internal error occurred.".to_string(),
            ApiError::Domain(e) => match e {
                DomainError::Validation(msg) => msg.clone(),
                DomainError::UnknownTemplate(code) => format!("Unknown template: {code}."),
                DomainError::Encoding(_) => {
                    "The badge ID cannot be encoded as a QR code.".to_string()
                }
                DomainError::LedgerContention { .. } => {
                    "The pickup ledger is busy. Please try again.".to_string()
                }
                DomainError::DirectoryUnavailable { .. } => {
                    "The ticket directory is unavailable. Refresh to try again.".to_string()
                }
                DomainError::Storage(_) => "The pickup ledger is unavailable.".to_string(),
                DomainError::TemplateLoad { code, .. } => {
                    format!("Template {code} could not be loaded.")
                }
                DomainError::FontLoad(_) | DomainError::Render(_) => {
                    "The badge document could not be produced.".to_string()
                }
            },
        }
    }

    fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), status = status.as_u16(), "request failed");
        } else {
            warn!(error = %self, code = self.code(), status = status.as_u16(), "request rejected");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = ApiErrorResponse {
            success: false,
            error: ApiErrorBody {
                code: self.code(),
                message: self.public_message(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::TemplateCode;

    #[test]
    fn taxonomy_maps_to_status_and_code() {
        let cases = [
            (DomainError::Validation("x".into()), 400, "VALIDATION_ERROR"),
            (DomainError::UnknownTemplate("XYZ".into()), 404, "UNKNOWN_TEMPLATE"),
            (DomainError::Encoding("x".into()), 422, "ENCODING_ERROR"),
            (
                DomainError::LedgerContention { id: "1".into(), attempts: 5 },
                409,
                "LEDGER_CONTENTION",
            ),
            (DomainError::directory("down"), 502, "DIRECTORY_UNAVAILABLE"),
            (DomainError::Storage("x".into()), 503, "LEDGER_UNAVAILABLE"),
            (
                DomainError::template(TemplateCode::Tff, "missing"),
                500,
                "TEMPLATE_LOAD_ERROR",
            ),
            (DomainError::Render("x".into()), 500, "RENDER_ERROR"),
        ];

        for (domain, status, code) in cases {
            let err = ApiError::from(domain);
            assert_eq!(err.status_code().as_u16(), status, "{code}");
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::from(DomainError::Storage("redis://secret@host refused".into()));
        assert!(!err.public_message().contains("secret"));

        let err = ApiError::from(DomainError::template(TemplateCode::Tfm, "/srv/public/x.pdf: ENOENT"));
        assert_eq!(err.public_message(), "Template TFM could not be loaded.");
    }

    #[test]
    fn missing_preview_is_not_found() {
        let err = ApiError::PreviewUnavailable(DomainError::template(TemplateCode::Tff, "gone"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "TEMPLATE_LOAD_ERROR");
    }
}
