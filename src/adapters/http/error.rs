use crate::utils::error::{ConverterError, ErrorCategory};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

impl ConverterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConverterError::CrsResolution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConverterError::BatchTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match self.category() {
                ErrorCategory::Input => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ConverterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            );
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(serde_json::json!({
            "error": self.user_friendly_message(),
            "suggestion": self.recovery_suggestion(),
            "category": format!("{:?}", self.category()).to_lowercase(),
        }));
        (status, body).into_response()
    }
}
