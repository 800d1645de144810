use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vaultshare_ledger::LedgerError;
use vaultshare_store::ContentError;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or failed credential check, before any ledger call
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ContentError> for ServerError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::NotFound(addr) => {
                ServerError::Ledger(LedgerError::NotFound(format!("content {addr}")))
            }
            ContentError::InvalidAddress(addr) => {
                ServerError::BadRequest(format!("invalid content address '{addr}'"))
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Ledger(e) => {
                let status = match e {
                    LedgerError::NotAuthorized(_) => StatusCode::FORBIDDEN,
                    LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                    LedgerError::UnknownIdentity(_) => StatusCode::NOT_FOUND,
                    LedgerError::AlreadyExists(_)
                    | LedgerError::VersionConflict { .. }
                    | LedgerError::AlreadyPending(_) => StatusCode::CONFLICT,
                    LedgerError::MalformedProof(_) => StatusCode::BAD_REQUEST,
                    LedgerError::VerifierUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => {
                        tracing::error!("Ledger error: {}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
