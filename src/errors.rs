use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::*;
use crate::models::ErrorBody;
use crate::transaction::TransactionError;
use crate::tree::TreeViolation;

/// Every failure a handler can report. Converted into a status code plus the
/// `{detail, errorCode}` envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Category name already exists for this type")]
    NameConflict,
    #[error("Maximum category depth of {max} levels exceeded")]
    DepthExceeded { max: u32 },
    #[error("A category cannot be moved under itself or one of its descendants")]
    CircularRelationship,
    #[error("{0}")]
    NotFound(String),
    #[error("Parent category belongs to another user")]
    Ownership,
    #[error("Cannot delete category: it has child categories")]
    HasChildren,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::DepthExceeded { .. }
            | ServiceError::CircularRelationship => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NameConflict | ServiceError::HasChildren | ServiceError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Ownership => StatusCode::FORBIDDEN,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Database(_) | ServiceError::Transaction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            ServiceError::Validation(_) => Some(CATEGORY_VALIDATION_ERROR),
            ServiceError::NameConflict => Some(CATEGORY_NAME_CONFLICT),
            ServiceError::DepthExceeded { .. } => Some(CATEGORY_DEPTH_EXCEEDED),
            ServiceError::CircularRelationship => Some(CATEGORY_CIRCULAR_RELATIONSHIP),
            ServiceError::NotFound(_) => Some(CATEGORY_NOT_FOUND),
            ServiceError::Ownership => Some(CATEGORY_OWNERSHIP_ERROR),
            ServiceError::HasChildren => Some(CATEGORY_HAS_CHILDREN),
            ServiceError::Unauthorized(_) => Some(UNAUTHORIZED_CODE),
            ServiceError::Database(_) | ServiceError::Transaction(_) => Some(INTERNAL_ERROR_CODE),
            ServiceError::BadRequest(_) | ServiceError::Conflict(_) => None,
        }
    }
}

impl From<TreeViolation> for ServiceError {
    fn from(violation: TreeViolation) -> Self {
        match violation {
            TreeViolation::ParentNotFound => {
                ServiceError::NotFound("Parent category not found".to_string())
            }
            TreeViolation::Circular => ServiceError::CircularRelationship,
            TreeViolation::DepthExceeded { .. } => ServiceError::DepthExceeded {
                max: MAX_CATEGORY_DEPTH + 1,
            },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            detail: self.to_string(),
            error_code: self.code().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
