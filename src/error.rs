//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::booking::BookingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{0}")]
    Unavailable(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Value::Null,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            AppError::Template(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        let retryable = err.is_retryable();
        match err {
            BookingError::Validation(errors) => AppError::Validation {
                message,
                details: json!({ "errors": errors }),
            },
            BookingError::Conflict {
                resource_id,
                conflicting_days,
            } => AppError::Conflict {
                message,
                details: json!({
                    "resource_id": resource_id,
                    "conflicting_days": conflicting_days,
                    "retryable": retryable,
                }),
            },
            BookingError::PricingUnavailable(resource_id) => AppError::Conflict {
                message,
                details: json!({ "resource_id": resource_id, "retryable": retryable }),
            },
            BookingError::ResourceInUse(resource_id) => AppError::Conflict {
                message,
                details: json!({ "resource_id": resource_id, "retryable": retryable }),
            },
            BookingError::InvalidTransition { from, to } => AppError::Conflict {
                message,
                details: json!({ "from": from, "to": to, "retryable": retryable }),
            },
            BookingError::SubmissionInFlight => AppError::Conflict {
                message,
                details: json!({ "retryable": retryable }),
            },
            BookingError::ResourceNotFound(_) | BookingError::ReservationNotFound(_) => {
                AppError::NotFound(message)
            }
            BookingError::Forbidden(_) => AppError::Forbidden(message),
            BookingError::StoreUnavailable(source) => {
                tracing::warn!("Booking store unavailable: {}", source);
                AppError::Unavailable("Booking service is temporarily unavailable, please try again".to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_type: &'static str,
    message: String,
    details: Value,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();

        let message = match &self {
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                "Internal error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let details = match self {
            AppError::Validation { details, .. } | AppError::Conflict { details, .. } => details,
            _ => Value::Null,
        };

        let body = ErrorBody {
            error_type,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_conflict_maps_to_409_with_days() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let err = AppError::from(BookingError::Conflict {
            resource_id: Uuid::nil(),
            conflicting_days: vec![day],
        });
        assert_eq!(err.parts().0, StatusCode::CONFLICT);
        match err {
            AppError::Conflict { details, .. } => {
                assert_eq!(details["conflicting_days"][0], "2024-03-02");
                assert_eq!(details["retryable"], true);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_store_failure_maps_to_503() {
        let err = AppError::from(BookingError::StoreUnavailable(StoreError::Timeout(
            std::time::Duration::from_secs(5),
        )));
        assert_eq!(err.parts(), (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"));
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = AppError::from(BookingError::validation("customer name is required"));
        assert_eq!(err.parts().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_forbidden_and_not_found() {
        assert_eq!(
            AppError::from(BookingError::Forbidden(Uuid::nil())).parts().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(BookingError::ReservationNotFound(Uuid::nil())).parts().0,
            StatusCode::NOT_FOUND
        );
    }
}
