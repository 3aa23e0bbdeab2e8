use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ml_model::ModelError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// A request-scoped failure, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid value '{value}' for parameter '{name}': expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A request the extractor refused, keeping its status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. }
            | Self::BadRequest(_)
            | Self::Model(ModelError::HyperParameters(_)) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Rejected { status, .. } => *status,
            Self::Model(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "{message}");
        } else {
            warn!(status = status.as_u16(), "{message}");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use insurance_structs::HyperParameterError;

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Model(ModelError::HyperParameters(HyperParameterError::ZeroDepth)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Model(ModelError::EmptyDataset).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Rejected {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: "too large".into(),
            }
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_invalid_parameter_message_names_parameter() {
        let err = ApiError::InvalidParameter {
            name: "max_depth",
            value: "deep".into(),
            expected: "a positive integer",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'deep' for parameter 'max_depth': expected a positive integer"
        );
    }
}
