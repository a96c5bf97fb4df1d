use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Endpoint(#[from] vpn_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Endpoint(e) => match e {
                vpn_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
                vpn_core::Error::Busy { .. } => StatusCode::CONFLICT,
                vpn_core::Error::Deletion { .. }
                | vpn_core::Error::Reconciliation(_)
                | vpn_core::Error::Infra(_) => StatusCode::BAD_GATEWAY,
                vpn_core::Error::DuplicateId(_)
                | vpn_core::Error::Provisioning(_)
                | vpn_core::Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
