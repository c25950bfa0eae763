use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy shared by the controllers and the HTTP layer.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Client-side check failed; never reaches the network.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    /// Signed in, but not allowed here.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Upstream answered with a non-2xx status.
    #[error("{}", .message.as_deref().unwrap_or("Upstream request failed"))]
    Remote {
        status: StatusCode,
        message: Option<String>,
    },

    /// Network failure or an unreadable upstream body.
    #[error("Upstream unreachable: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PortalError {
    /// Server-supplied message of a remote failure, if any.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            PortalError::Remote { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Auth(_) => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Remote { .. } | PortalError::Transport(_) => StatusCode::BAD_GATEWAY,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        PortalError::Transport(e.to_string())
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
