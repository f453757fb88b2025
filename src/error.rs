use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Blockchain RPC error: {0}")]
    Blockchain(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Transaction step failed: {step}")]
    TxStep { step: &'static str, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Wraps a failed chain call made as one step of a multi-step flow.
    pub fn step(step: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::TxStep {
            step,
            detail: err.to_string(),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InvalidAddress(addr) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ADDRESS",
                format!("invalid address: {}", addr),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Blockchain(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "BLOCKCHAIN_ERROR",
                msg.clone(),
            ),
            // The raw provider message is logged at the failure site, clients only
            // see which step broke.
            AppError::TxStep { step, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TX_FAILED",
                step.to_string(),
            ),
            AppError::Signer(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SIGNER_ERROR",
                "auth error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
