//! ruc-web library - RUClasses HTTP service
//!
//! JSON API over the review service: subject browsing, sign-in sessions,
//! submitting reviews, and the signed-in user's own reviews.

use axum::Router;
use ruc_common::config::AppConfig;
use ruc_common::db::DocumentStore;
use ruc_common::identity::SessionManager;
use ruc_common::reviews::ReviewService;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<ReviewService>,
    pub sessions: Arc<SessionManager>,
    pub config: Arc<AppConfig>,
    /// Shared secret for sign-in assertions (0 disables verification)
    pub shared_secret: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: AppConfig, shared_secret: i64) -> Self {
        let reviews = ReviewService::new(DocumentStore::new(db), config.catalog.clone());
        Self {
            reviews: Arc::new(reviews),
            sessions: Arc::new(SessionManager::new(config.session_idle_timeout())),
            config: Arc::new(config),
            shared_secret,
        }
    }
}

/// Build application router
///
/// Browsing and sign-in are public; everything that acts as a user goes
/// through the session middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/api/auth/sign-out", post(api::sign_out))
        .route("/api/auth/me", get(api::me))
        .route("/api/auth/events", get(api::auth_events))
        .route("/api/reviews", post(api::submit_review))
        .route("/api/me/reviews", get(api::my_reviews))
        .route(
            "/api/me/reviews/:subject/:id",
            axum::routing::delete(api::delete_review),
        )
        .route("/api/me/reviews/:subject/:id/edit", post(api::begin_edit))
        .route("/api/me/edit", get(api::get_edit).put(api::update_edit))
        .route("/api/me/edit/save", post(api::save_edit))
        .route("/api/me/edit/cancel", post(api::cancel_edit))
        .route("/api/me/counters/reconcile", post(api::reconcile_counters))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    // Public routes (no session)
    let public = Router::new()
        .route("/api/auth/sign-in", post(api::sign_in))
        .route("/api/subjects", get(api::list_subjects))
        .route("/api/subjects/:code/reviews", get(api::subject_reviews))
        .route("/api/options", get(api::form_options))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
