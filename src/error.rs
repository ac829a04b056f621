use thiserror::Error;

/// Failures of the workbook-backed record access layer.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("workbook could not be read: {0}")]
    Unreadable(String),

    #[error("row {row} of sheet '{sheet}' is malformed: {detail}")]
    MalformedRow {
        sheet: String,
        row: usize,
        detail: String,
    },

    #[error("workbook could not be written: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for WorkbookError {
    fn from(e: calamine::Error) -> Self {
        WorkbookError::Unreadable(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for WorkbookError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        WorkbookError::Write(e.to_string())
    }
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("authentication is not configured: {0}")]
    NotConfigured(&'static str),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] WorkbookError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Internal(String),
}

#[cfg(feature = "web")]
mod response {
    use super::{ApiError, AuthError};
    use axum::Json;
    use axum::extract::rejection::{JsonRejection, QueryRejection};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde_json::json;

    impl IntoResponse for AuthError {
        fn into_response(self) -> Response {
            let status = match self {
                AuthError::MissingToken | AuthError::BadCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::FORBIDDEN,
                AuthError::NotConfigured(_) => {
                    log::error!("{}", self);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "message": "Internal Server Error" })),
                    )
                        .into_response();
                }
            };
            (status, Json(json!({ "message": self.to_string() }))).into_response()
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            match self {
                ApiError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
                }
                ApiError::NotFound(msg) => {
                    log::warn!("{}", msg);
                    (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
                }
                ApiError::Auth(e) => e.into_response(),
                // Storage detail stays in the log only.
                ApiError::Storage(e) => {
                    log::error!("storage failure: {}", e);
                    internal_error()
                }
                ApiError::Internal(msg) => {
                    log::error!("internal failure: {}", msg);
                    internal_error()
                }
            }
        }
    }

    // Malformed request bodies and query strings are client errors.
    impl From<JsonRejection> for ApiError {
        fn from(rejection: JsonRejection) -> Self {
            ApiError::Validation(rejection.body_text())
        }
    }

    impl From<QueryRejection> for ApiError {
        fn from(rejection: QueryRejection) -> Self {
            ApiError::Validation(rejection.body_text())
        }
    }

    fn internal_error() -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal Server Error" })),
        )
            .into_response()
    }
}
