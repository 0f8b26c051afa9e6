//! API layer -- axum routes, handlers, and error mapping.

mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use self::state::AppState;
use crate::meeting::MeetingError;
use crate::scheduler::SchedulerError;

/// Build the application router with all API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

#[derive(Debug)]
pub enum ApiError {
    MeetingNotFound(String),
    Meeting(MeetingError),
}

impl From<MeetingError> for ApiError {
    fn from(e: MeetingError) -> Self {
        ApiError::Meeting(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MeetingNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Meeting(e) => match e {
                MeetingError::NoSession => StatusCode::NOT_FOUND,
                MeetingError::HostOnly(_) => StatusCode::FORBIDDEN,
                MeetingError::EmptyTarget | MeetingError::Join(_) => StatusCode::BAD_REQUEST,
                MeetingError::Scheduler(SchedulerError::IntervalOutOfRange { .. }) => {
                    StatusCode::BAD_REQUEST
                }
                MeetingError::Scheduler(_) | MeetingError::Session(_) => StatusCode::CONFLICT,
                MeetingError::Transport(_) => StatusCode::BAD_GATEWAY,
                MeetingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::MeetingNotFound(id) => format!("meeting {id} is not open"),
            ApiError::Meeting(MeetingError::Storage(e)) => {
                tracing::error!("request failed: {:#}", e);
                "internal storage error".to_string()
            }
            ApiError::Meeting(e) => e.to_string(),
        };
        let body = json!({
            "data": null,
            "meta": { "error": message, "status": status.as_u16() }
        });
        (status, Json(body)).into_response()
    }
}
