//! The signed-in user's own reviews
//!
//! Listing, the edit flow (begin, change draft, save, cancel), deletion,
//! and counter reconciliation. Edit state lives in the caller's session.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use ruc_common::counter::CounterDrift;
use ruc_common::db::models::{Review, ReviewDraft};
use ruc_common::edit::EditState;
use ruc_common::identity::Session;
use ruc_common::Error;
use serde_json::{json, Value};
use tracing::info;

use super::error::{ApiError, ApiResult, Notice};
use super::subjects::ReviewView;
use crate::AppState;

pub const UPDATED: &str = "Review updated successfully!";
pub const UPDATE_FAILED: &str = "Error updating review. Please try again.";
pub const DELETED: &str = "Review deleted successfully!";
pub const DELETE_FAILED: &str = "Error deleting review. Please try again.";

/// GET /api/me/reviews
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Value>> {
    let reviews: Vec<ReviewView> = state
        .reviews
        .user_reviews(&session.user.uid)
        .await?
        .into_iter()
        .map(ReviewView::from)
        .collect();

    Ok(Json(json!({
        "greeting": session.user.greeting(),
        "reviews": reviews,
    })))
}

/// POST /api/me/reviews/:subject/:id/edit
///
/// Opens the review for editing, replacing any edit already open.
pub async fn begin_edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((subject, id)): Path<(String, String)>,
) -> ApiResult<Json<EditState>> {
    let review: Review = state
        .reviews
        .load_owned(&session.user.uid, &subject, &id)
        .await?;

    let edit = state
        .sessions
        .with_edit(&session.token, |edit| {
            edit.begin(&review);
            edit.clone()
        })
        .await?;
    Ok(Json(edit))
}

/// GET /api/me/edit
pub async fn get_edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<EditState>> {
    Ok(Json(state.sessions.edit_state(&session.token).await?))
}

/// PUT /api/me/edit - replace the working draft
pub async fn update_edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<ReviewDraft>,
) -> ApiResult<Json<EditState>> {
    let edit = state
        .sessions
        .with_edit(&session.token, |edit| {
            edit.replace_draft(draft).map(|_| edit.clone())
        })
        .await??;
    Ok(Json(edit))
}

/// POST /api/me/edit/save
///
/// A rejected draft keeps the edit open so the user can fix it.
pub async fn save_edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Value>> {
    let pending = state
        .sessions
        .edit_state(&session.token)
        .await?
        .pending()
        .ok_or_else(|| Error::NotFound("No review is being edited".to_string()))?;

    let review = state
        .reviews
        .save_edit(&session.user.uid, &pending)
        .await
        .map_err(|e| ApiError::from(e).storage_message(UPDATE_FAILED))?;

    state
        .sessions
        .with_edit(&session.token, |edit| {
            if edit.active_edit_id() == Some(review.id.as_str()) {
                edit.cancel();
            }
        })
        .await?;

    Ok(Json(json!({
        "severity": "success",
        "message": UPDATED,
        "review": ReviewView::from(review),
    })))
}

/// POST /api/me/edit/cancel
pub async fn cancel_edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<EditState>> {
    let edit = state
        .sessions
        .with_edit(&session.token, |edit| {
            edit.cancel();
            edit.clone()
        })
        .await?;
    Ok(Json(edit))
}

/// DELETE /api/me/reviews/:subject/:id
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((subject, id)): Path<(String, String)>,
) -> ApiResult<Json<Notice>> {
    state
        .reviews
        .delete(&session.user.uid, &subject, &id)
        .await
        .map_err(|e| ApiError::from(e).storage_message(DELETE_FAILED))?;

    // A deleted review cannot stay open for editing
    state
        .sessions
        .with_edit(&session.token, |edit| {
            if edit.active_edit_id() == Some(id.as_str()) {
                edit.cancel();
            }
        })
        .await?;

    Ok(Json(Notice::success(DELETED)))
}

/// POST /api/me/counters/reconcile
///
/// Returns the counters that were out of line and have been fixed.
pub async fn reconcile_counters(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<CounterDrift>>> {
    let drift = state.reviews.reconcile_counters(&session.user.uid).await?;
    info!(
        "Reconciled review counters for {} ({} fixed)",
        session.user.uid,
        drift.len()
    );
    Ok(Json(drift))
}
