use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failure while running a single statement against the store.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("query did not complete within {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    /// True when the store could not be reached at all, as opposed to a
    /// statement that reached it and failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            QueryError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid value {value:?} for path parameter `{name}`")]
    InvalidParam { name: &'static str, value: String },

    #[error("path parameter `{0}` was not captured by the route")]
    MissingParam(&'static str),

    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    /// Message sent to the client. Server-side causes stay in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidParam { .. } => self.to_string(),
            ApiError::MissingParam(_) => "internal server error".to_string(),
            ApiError::Query(QueryError::Timeout(_)) => "query timed out".to_string(),
            ApiError::Query(err) if err.is_unavailable() => "database unavailable".to_string(),
            ApiError::Query(_) => "database query failed".to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParam { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingParam(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Query(QueryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Query(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let invalid = ApiError::InvalidParam {
            name: "id",
            value: "abc".to_string(),
        };
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let timeout = ApiError::from(QueryError::Timeout(Duration::from_millis(10)));
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let closed = ApiError::from(QueryError::from(sqlx::Error::PoolClosed));
        assert_eq!(closed.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let missing_row = ApiError::from(QueryError::from(sqlx::Error::RowNotFound));
        assert_eq!(missing_row.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_cause_not_exposed() {
        let err = ApiError::from(QueryError::from(sqlx::Error::Protocol(
            "no such table: customers".to_string(),
        )));
        assert_eq!(err.public_message(), "database query failed");
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_invalid_param_message_names_param() {
        let err = ApiError::InvalidParam {
            name: "id",
            value: "1 OR 1=1".to_string(),
        };
        assert_eq!(
            err.public_message(),
            "invalid value \"1 OR 1=1\" for path parameter `id`"
        );
    }
}
