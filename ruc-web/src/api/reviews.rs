//! Review submission

use axum::{extract::State, http::StatusCode, Extension, Json};
use ruc_common::db::models::ReviewDraft;
use ruc_common::identity::Session;
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use crate::AppState;

pub const SUBMITTED: &str = "Review submitted successfully!";
pub const SUBMIT_FAILED: &str = "Error submitting review. Please try again.";

/// POST /api/reviews
pub async fn submit_review(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<ReviewDraft>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let review = state
        .reviews
        .submit(&session.user, &draft)
        .await
        .map_err(|e| ApiError::from(e).storage_message(SUBMIT_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "severity": "success",
            "message": SUBMITTED,
            "review": review,
        })),
    ))
}
