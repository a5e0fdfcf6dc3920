//! HTTP surface for the ask pipeline.

use crate::core::fetcher::{ResilientSource, StubAnalytics};
use crate::core::pipeline::AskPipeline;
use crate::domain::model::{AskRequest, AskResponse};
use crate::domain::ports::AnalyticsSource;
use crate::utils::error::AgentError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state. The source defaults to the stub wrapped with the
/// configured timeout and retries.
pub struct AppState<S: AnalyticsSource = ResilientSource<StubAnalytics>> {
    pub pipeline: Arc<AskPipeline<S>>,
    pub start_time: Instant,
}

impl<S: AnalyticsSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            start_time: self.start_time,
        }
    }
}

impl<S: AnalyticsSource> AppState<S> {
    pub fn new(pipeline: AskPipeline<S>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Wraps [`AgentError`] so it can be returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                "Request failed: {} (Category: {:?}, Severity: {:?})",
                err,
                err.category(),
                err.severity()
            );
        } else {
            tracing::warn!("Request rejected: {}", err);
        }

        let body = Json(json!({
            "error": {
                "type": err.error_type(),
                "message": err.user_friendly_message(),
            }
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

/// Maps body extraction failures to the error envelope. Deserializer details
/// only go to the log.
fn reject_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());

    let (field, reason) = match rejection {
        JsonRejection::MissingJsonContentType(_) => ("content-type", "must be application/json"),
        JsonRejection::JsonSyntaxError(_) => ("body", "must be valid JSON"),
        JsonRejection::JsonDataError(_) => (
            "body",
            "must be an object with string fields store_id and question",
        ),
        _ => ("body", "could not be read"),
    };

    ApiError(AgentError::InvalidRequest {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

/// Turns a handler panic into a generic 500 envelope.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError(AgentError::Internal {
        message: format!("handler panicked: {}", message),
    })
    .into_response()
}

pub async fn health_check<S: AnalyticsSource>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.uptime_seconds(),
    })
}

pub async fn ask<S: AnalyticsSource>(
    State(state): State<AppState<S>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(reject_body)?;
    let response = state.pipeline.ask(&request).await?;
    Ok(Json(response))
}

pub fn router<S: AnalyticsSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check::<S>))
        .route("/ask", post(ask::<S>))
        // gateway path used by the storefront app
        .route("/api/v1/questions", post(ask::<S>))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
