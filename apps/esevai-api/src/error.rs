//! Error types for the e-Sevai API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use esevai_types::{ParseStatusError, PaymentStatus, RequestStatus};
use esign_utils::EsignError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request cannot move from {from} to {to}")]
    InvalidRequestTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Payment cannot move from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("E-sign failed: {0}")]
    Esign(#[from] EsignError),

    #[error("Corrupt stored value: {0}")]
    CorruptRecord(#[from] ParseStatusError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidRequestTransition { .. }
            | ApiError::InvalidPaymentTransition { .. }
            | ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Esign(EsignError::OperationError(e)) => {
                tracing::error!("PDF operation error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF processing failed".to_string(),
                )
            }
            ApiError::Esign(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::CorruptRecord(e) => {
                tracing::error!("Corrupt stored value: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Map unique-constraint violations to 409, everything else to a database error
pub fn conflict_on_unique(err: sqlx::Error, what: &str) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict(format!("{} already exists", what))
        }
        _ => ApiError::Database(err),
    }
}
