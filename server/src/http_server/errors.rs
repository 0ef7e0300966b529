use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{favorites::FavoritesError, recipes::sources::GenerationError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Login required")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Conflict(String),
    #[error("Recipe search failed")]
    Search(String),
    #[error("Could not suggest alternatives")]
    Alternatives(#[source] GenerationError),
    #[error("Could not access favorites, please try again later")]
    Database(#[source] FavoritesError),
    #[error("Internal server error")]
    Internal(color_eyre::Report),
}

impl ApiError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Conflict(_) => "CONFLICT",
            Self::Search(_) => "SEARCH_ERROR",
            Self::Alternatives(_) => "ALTERNATIVES_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Search(_) | Self::Alternatives(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<color_eyre::Report> for ApiError {
    fn from(report: color_eyre::Report) -> Self {
        Self::Internal(report)
    }
}

impl From<FavoritesError> for ApiError {
    fn from(err: FavoritesError) -> Self {
        match err {
            FavoritesError::Conflict(_) => Self::Conflict(err.to_string()),
            FavoritesError::NotFound => Self::NotFound(err.to_string()),
            FavoritesError::Database(_) | FavoritesError::Corrupt(_) => Self::Database(err),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(FavoritesError::Database(err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            match &self {
                Self::Internal(report) => {
                    sentry::capture_message(&format!("{report:?}"), sentry::Level::Error);
                    tracing::error!(error = ?report, "Internal error");
                }
                other => {
                    sentry::capture_error(other);
                    tracing::error!(error = ?other, "Request failed");
                }
            }
        }

        let message = self.to_string();
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code(),
                message: &message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Successful responses are wrapped as `{ "success": true, "data": ... }`.
#[derive(Debug)]
pub(crate) struct ApiResponse<T>(pub T);

#[derive(Serialize)]
struct SuccessEnvelope<T> {
    success: bool,
    data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(SuccessEnvelope {
            success: true,
            data: self.0,
        })
        .into_response()
    }
}

pub(crate) type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_server::test_helpers::response_body_json;

    #[tokio::test]
    async fn errors_render_the_envelope() {
        let response = ApiError::InvalidInput("ingredients is required".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response_body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": { "code": "INVALID_INPUT", "message": "ingredients is required" }
            })
        );
    }

    #[test]
    fn server_errors_are_sent_to_sentry() {
        let events = sentry::test::with_captured_events(|| {
            let _ = ApiError::Internal(color_eyre::eyre::eyre!("pool exhausted")).into_response();
            let _ = ApiError::Search("task panicked".to_string()).into_response();
            let _ = ApiError::InvalidInput("bad".to_string()).into_response();
        });

        assert_eq!(events.len(), 2);
        assert!(events[0]
            .message
            .as_deref()
            .is_some_and(|m| m.contains("pool exhausted")));
    }

    #[test]
    fn favorites_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(FavoritesError::Conflict("Soup".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(FavoritesError::NotFound).code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::from(FavoritesError::Database(sqlx::Error::PoolTimedOut)).code(),
            "DATABASE_ERROR"
        );
    }
}
