use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Login state error: {0}")]
    LoginState(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Endaoment API request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("Login state store error: {0}")]
    Store(#[from] StoreError),
    #[error("Collaborator error: {0}")]
    Collaborator(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::LoginState(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TokenExchange(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Collaborator(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Malformed input is a 400 here, whatever axum's own rejection status would be.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = %status, "{self}");
        } else {
            tracing::warn!(status = %status, "{self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
