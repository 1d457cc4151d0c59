use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors raised by the calculation engine and its input parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Panel, inverter or battery key that is not in the catalog
    #[error("Unknown {category} type: '{key}'")]
    InvalidEquipmentSelection { category: &'static str, key: String },

    /// A field is missing, non-numeric or outside its domain
    #[error("Malformed input for '{field}': {reason}")]
    MalformedInput { field: String, reason: String },
}

impl CalcError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A row exists but its JSON payload no longer decodes
    #[error("Stored calculation {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Unavailable(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Typst compilation failed: {0}")]
    Compile(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),
}

/// Boundary error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Calculation {0} not found")]
    NotFound(i64),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Calc(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(StorageError::Corrupt { .. }) | AppError::Report(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (
            status,
            Json(serde_json::json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid = AppError::from(CalcError::InvalidEquipmentSelection {
            category: "panel",
            key: "perovskite".to_string(),
        });
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_string(), "Unknown panel type: 'perovskite'");

        assert_eq!(AppError::NotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StorageError::Unavailable("disk full".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ReportError::Render("no pages".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_message() {
        let e = CalcError::malformed("panel_count", "expected a number, got \"ten\"");
        assert_eq!(
            e.to_string(),
            "Malformed input for 'panel_count': expected a number, got \"ten\""
        );
    }
}
