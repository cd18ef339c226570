//! API error taxonomy
//!
//! One error type for every handler, mapped onto the HTTP codes the
//! frontend understands. Provider failures keep their detail in the logs
//! and reach the client as a generic upstream failure; validation and
//! registry errors pass their messages through.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::composer::ComposeError;
use crate::providers::ProviderError;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("permission-denied")]
    PermissionDenied,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<ComposeError> for AppError {
    fn from(error: ComposeError) -> Self {
        match error {
            ComposeError::UnknownAccount(_) => AppError::NotFound(error.to_string()),
            ComposeError::Registry(inner) => AppError::Registry(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Registry(error) => registry_response(error),
            AppError::Provider(error) => provider_response(error),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn registry_response(error: RegistryError) -> (StatusCode, String) {
    match error {
        RegistryError::NoAccountsAvailable => {
            (StatusCode::SERVICE_UNAVAILABLE, error.to_string())
        }
        RegistryError::EmailInUse => (StatusCode::CONFLICT, error.to_string()),
        RegistryError::Provider(inner) => provider_response(inner),
    }
}

fn provider_response(error: ProviderError) -> (StatusCode, String) {
    if error.is_not_found() {
        return (StatusCode::NOT_FOUND, error.to_string());
    }
    warn!(%error, "Upstream provider failure");
    (
        StatusCode::BAD_GATEWAY,
        "upstream service unavailable".to_string(),
    )
}
