//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::router::RouterError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plan", post(plan))
        .route("/plan/more", post(more_results))
        .route("/plan/cancel", post(cancel))
        .route("/plan/restart", post(restart))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan a trip, replacing any previous results.
async fn plan(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "invalid plan request");
        AppError::BadRequest {
            message: format!("invalid JSON: {e}"),
        }
    })?;
    let query = req
        .to_query()
        .map_err(|message| AppError::BadRequest { message })?;

    let mut session = state.session().lock().await;
    let router = session.get_or_insert_with(|| state.new_router(query.clone()));
    router.set_query(query);

    // the plan carries the NoProvider signal
    if let Err(e) = router.fetch_first_results().await {
        debug!(error = %e, "first fetch ended without provider");
    }

    let response = PlanResponse::from_plan(router.plan(), router.current_provider());
    Ok(Json(response).into_response())
}

/// Extend the current results.
async fn more_results(State(state): State<AppState>) -> Result<Response, AppError> {
    let mut session = state.session().lock().await;
    let router = session.as_mut().ok_or(RouterError::NoPreviousProvider)?;
    router.fetch_more_results().await?;

    let response = PlanResponse::from_plan(router.plan(), router.current_provider());
    Ok(Json(response).into_response())
}

/// Cancel the request in flight, if any.
async fn cancel(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.cancel(),
    })
}

/// Forget cached routes and providers and clear the plan.
async fn restart(State(state): State<AppState>) -> StatusCode {
    state.cancel();
    if let Some(router) = state.session().lock().await.as_mut() {
        router.restart_session();
    }
    StatusCode::NO_CONTENT
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
}

impl From<RouterError> for AppError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::NoProviderAvailable => AppError::NotFound {
                message: e.to_string(),
            },
            RouterError::NoPreviousProvider => AppError::Conflict {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
        };

        debug!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
