pub mod events;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scicloud_core::SciCloudError;
use scicloud_core::validation::FieldError;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::state::AppState;

/// The full application router, CORS included.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(events::router())
        .with_state(state)
        .layer(cors)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Convert errors to HTTP responses. Calendar errors keep their kind.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<SciCloudError>() {
            Some(SciCloudError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            Some(SciCloudError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(SciCloudError::InvalidTimeRange { .. } | SciCloudError::ValidationFailed(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let fields = self
            .0
            .downcast_ref::<SciCloudError>()
            .map(|e| e.field_errors().to_vec())
            .unwrap_or_default();
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            fields,
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
