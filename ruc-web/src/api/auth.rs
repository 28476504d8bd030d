//! Sign-in, sign-out and the session middleware
//!
//! Protected routes carry `Authorization: Bearer <token>`. Event streams may
//! pass the token as `?access_token=` instead, since browsers cannot set
//! headers on an EventSource.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{sse::Event, IntoResponse, Response, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use ruc_common::identity::{verify_assertion, AuthError, Session};
use serde_json::{json, Value};
use std::convert::Infallible;
use tracing::warn;

use super::error::{ApiResult, Notice};
use crate::AppState;

/// Session token from the Authorization header or `access_token` query param
fn bearer_token(request: &Request) -> Option<String> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        return value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
    }

    request.uri().query().and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "access_token")
            .map(|(_, token)| token.to_string())
    })
}

/// Session middleware
///
/// Resolves the bearer token to a [`Session`] and hands it to the handler
/// as a request extension. Missing or unknown tokens get 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request).ok_or(AuthError::MissingSession)?;
    let session = state
        .sessions
        .current(&token)
        .await
        .ok_or(AuthError::UnknownSession)?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// POST /api/auth/sign-in
///
/// Body is the signed assertion from the identity front end. Returns the
/// bearer token for the new session.
pub async fn sign_in(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Response> {
    let user = verify_assertion(&body, state.shared_secret, state.config.max_assertion_age_ms)
        .map_err(|e| {
            warn!("Error signing in: {}", e);
            e
        })?;

    let session = state.sessions.sign_in(user).await;
    let greeting = session.user.greeting();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": session.token,
            "user": session.user,
            "greeting": greeting,
        })),
    )
        .into_response())
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Notice>> {
    state.sessions.sign_out(&session.token).await?;
    Ok(Json(Notice::success("Signed out.")))
}

/// GET /api/auth/me
pub async fn me(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({
        "user": session.user,
        "greeting": session.user.greeting(),
        "signedInAt": session.signed_in_at,
    }))
}

/// GET /api/auth/events - SSE stream of the caller's sign-in state
pub async fn auth_events(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    ruc_common::sse::auth_event_stream(state.sessions.subscribe(), session.user.uid, session.token)
}
