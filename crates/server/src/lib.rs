//! HTTP surface for watch-progress tracking.
//!
//! One `/progress` route, two operations: GET returns the resume position
//! for a (activity, user) pair, POST records a watch-session submission.
//! Authentication is handled by the collaborator fronting this service; the
//! user id arrives as an explicit parameter.

#![forbid(unsafe_code)]

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;

use services::{AppServices, AttemptServiceError, ResumeError, SubmitOutcome};
use storage::repository::{ActivityRepository, StorageError};
use videotrack_core::model::{ActivityId, AttemptDraft, UserId};

/// Shared state for the progress handlers.
#[derive(Clone)]
pub struct ProgressState {
    services: AppServices,
}

/// Create the progress API router.
pub fn create_router(services: AppServices) -> Router {
    Router::new()
        .route("/progress", get(get_progress).post(post_progress))
        .layer(CorsLayer::permissive())
        .with_state(ProgressState { services })
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    cmid: u64,
    user: u64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    cmid: u64,
    user: u64,
    time_watched: f64,
    completed: u8,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub status: &'static str,
    pub time_watched: f64,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "status": "error",
        "message": message.into(),
    });
    (code, Json(body)).into_response()
}

//
// ─── HANDLERS ──────────────────────────────────────────────────────────────────
//

/// Resume lookup: latest unfinished watched time for the pair.
async fn get_progress(
    State(state): State<ProgressState>,
    Query(params): Query<ProgressQuery>,
) -> Response {
    let activity_id = ActivityId::new(params.cmid);
    let user_id = UserId::new(params.user);

    // An unknown module aborts the request rather than answering "notfound",
    // which is reserved for a known module with no history.
    if let Err(err) = state.services.activities().get_activity(activity_id).await {
        return storage_error_response(&err, "resume lookup");
    }

    match state.services.resume().resume_point(activity_id, user_id).await {
        Ok(Some(time_watched)) => Json(ProgressResponse {
            status: "success",
            time_watched,
        })
        .into_response(),
        Ok(None) => Json(ProgressResponse {
            status: "notfound",
            time_watched: 0.0,
        })
        .into_response(),
        Err(ResumeError::Storage(err)) => storage_error_response(&err, "resume lookup"),
        Err(err) => {
            error!(error = %err, "resume lookup failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "resume lookup failed")
        }
    }
}

/// Submission: insert an attempt row, or report a skip when the pair is
/// already complete.
async fn post_progress(
    State(state): State<ProgressState>,
    Form(form): Form<SubmitForm>,
) -> Response {
    if form.completed > 1 {
        return error_response(StatusCode::BAD_REQUEST, "completed must be 0 or 1");
    }

    let draft = AttemptDraft {
        watched_seconds: form.time_watched,
        completed: form.completed == 1,
    };

    let outcome = state
        .services
        .attempts()
        .submit_attempt(ActivityId::new(form.cmid), UserId::new(form.user), draft)
        .await;

    match outcome {
        Ok(SubmitOutcome::Recorded { .. }) => Json(ProgressResponse {
            status: "success",
            time_watched: form.time_watched,
        })
        .into_response(),
        Ok(SubmitOutcome::Skipped) => Json(ProgressResponse {
            status: "skipped",
            time_watched: 0.0,
        })
        .into_response(),
        Err(AttemptServiceError::Attempt(err)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(AttemptServiceError::Storage(err)) => storage_error_response(&err, "submission"),
        Err(err) => {
            error!(error = %err, "attempt submission failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "submission failed")
        }
    }
}

fn storage_error_response(err: &StorageError, operation: &str) -> Response {
    match err {
        StorageError::NotFound => error_response(StatusCode::NOT_FOUND, "unknown activity"),
        other => {
            error!(error = %other, operation, "storage failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{operation} failed"))
        }
    }
}
