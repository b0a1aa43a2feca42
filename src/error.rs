use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::response::ApiResponse;

/// Domain error taxonomy. Every failure a handler can surface maps onto one
/// of these; anything unexpected from a lower layer is normalized to
/// `Internal` so its detail is logged but never leaked.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized access")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{field} already exists")]
    Conflict { field: &'static str },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Due date cannot be in the past")]
    InvalidDueDate,
    #[error("{0}")]
    InvalidTransition(&'static str),
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::InvalidDueDate | Self::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // users.email carries the only unique constraint in the schema
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return Self::Conflict { field: "email" };
            }
        }
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            tracing::error!(error = ?source, "internal error");
        }
        let body = ApiResponse::error(self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Conflict { field: "email" }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::NotFound("Task").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidDueDate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidTransition("Task is already completed").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn conflict_names_the_field() {
        let err = ApiError::Conflict { field: "email" };
        assert_eq!(err.to_string(), "email already exists");
    }

    #[test]
    fn internal_error_does_not_leak_detail() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused on 5432"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
