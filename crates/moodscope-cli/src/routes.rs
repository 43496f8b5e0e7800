//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use moodscope_classifiers::analysis::posts_from_values;
use moodscope_classifiers::time_window::{filter_since, window_start};
use moodscope_classifiers::{AnalysisReport, ClassificationResult};
use moodscope_core::Error;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::server::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/classify", post(classify))
        .route("/v1/analyze", post(analyze))
        .route("/admin/reload", post(reload))
        .fallback(fallback)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    /// Raw post objects; entries that do not decode as posts are dropped
    posts: Vec<serde_json::Value>,

    /// Restrict the batch to the last `months` months
    #[serde(default)]
    months: Option<u32>,
}

async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassificationResult>, ApiError> {
    metrics::counter!("moodscope_requests_total", "route" => "classify").increment(1);

    let context = state.shared.current()?;
    let result = context.classify(&request.text)?;
    debug!(
        "Classified text as {} ({:.3}) in {}us",
        result.label, result.score, result.latency_us
    );
    Ok(Json(result))
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    metrics::counter!("moodscope_requests_total", "route" => "analyze").increment(1);

    if request.months == Some(0) {
        return Err(Error::input("months must be positive").into());
    }

    let start = request
        .months
        .map(|months| window_start(months, &Local::now()))
        .transpose()?;

    let analyzer = state.analyzer()?;
    let report = tokio::task::spawn_blocking(move || {
        let posts = posts_from_values(request.posts);
        let posts = match start {
            Some(start) => filter_since(&posts, start),
            None => posts,
        };
        analyzer.analyze(&posts).report()
    })
    .await
    .map_err(|e| {
        error!("Analysis task failed: {}", e);
        ApiError::internal("analysis task failed")
    })?;

    Ok(Json(report))
}

async fn reload(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    metrics::counter!("moodscope_requests_total", "route" => "reload").increment(1);

    let shared = state.clone();
    tokio::task::spawn_blocking(move || shared.reload())
        .await
        .map_err(|e| {
            error!("Reload task failed: {}", e);
            ApiError::internal("reload task failed")
        })??;

    let context = state.shared.current()?;
    info!("Serving reloaded model");
    Ok(Json(json!({
        "status": "reloaded",
        "vocabulary_size": context.vocabulary().len(),
        "features": context.model().feature_count(),
    })))
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
}

/// Error response with a status derived from the pipeline error
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else if matches!(err, Error::Input(_) | Error::Tokenize(_)) {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Request failed with {}: {}", self.status, self.message);
        metrics::counter!("moodscope_errors_total", "status" => self.status.as_str().to_string())
            .increment(1);
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
