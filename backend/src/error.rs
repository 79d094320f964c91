//! Error handling for the Fish Trading Management Platform
//!
//! Provides consistent JSON error responses for all handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::AllocationError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    // Allocation errors (core business logic)
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: message.clone(),
                    field: Some(resource.clone()),
                },
            ),
            AppError::Allocation(AllocationError::InsufficientStock { shortfall }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: format!(
                        "Insufficient stock to allocate. Short by {} kg",
                        shortfall
                    ),
                    field: None,
                },
            ),
            AppError::Allocation(AllocationError::InvalidQuantity { quantity }) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_QUANTITY".to_string(),
                    message: format!("Requested quantity must be positive, got {}", quantity),
                    field: Some("quantity_kg".to_string()),
                },
            ),
            AppError::Allocation(AllocationError::DataIntegrity { lot_id }) => {
                tracing::error!("Data integrity violation on lot {}", lot_id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail {
                        code: "DATA_INTEGRITY".to_string(),
                        message: format!(
                            "Allocations for lot {} exceed its purchased quantity",
                            lot_id
                        ),
                        field: None,
                    },
                )
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail {
                        code: "DATABASE_ERROR".to_string(),
                        message: "A database error occurred".to_string(),
                        field: None,
                    },
                )
            }
            AppError::InternalError(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                    },
                )
            }
        };

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Convenience result type for handlers and services
pub type AppResult<T> = Result<T, AppError>;
