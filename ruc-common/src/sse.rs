//! Server-Sent Events (SSE) utilities
//!
//! Streams a user's sign-in / sign-out changes to the browser so open pages
//! can follow the auth state.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::identity::AuthStateChange;

/// SSE stream of `uid`'s auth changes, opened with a `ConnectionStatus` event
///
/// The stream ends when the session holding `token` ends. Sign-outs of the
/// user's other sessions are not forwarded.
pub fn auth_event_stream(
    mut events: broadcast::Receiver<AuthStateChange>,
    uid: String,
    token: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to auth events for {}", uid);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match events.recv().await {
                Ok(change) if change.uid() == uid => {
                    let signed_out = matches!(change, AuthStateChange::SignedOut { .. });
                    let own_session = change.token() == token;
                    if signed_out && !own_session {
                        continue;
                    }
                    debug!("SSE: {} for {}", change.event_type(), uid);
                    match Event::default().event(change.event_type()).json_data(&change) {
                        Ok(event) => yield Ok(event),
                        Err(e) => warn!("SSE: failed to encode auth event: {}", e),
                    }
                    if signed_out {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("SSE: auth event stream for {} lagged by {}", uid, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("SSE: auth event stream for {} closed", uid);
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
