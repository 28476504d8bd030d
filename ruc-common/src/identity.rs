//! Sign-in and sessions
//!
//! The identity front end signs users in and hands the browser a signed
//! assertion `{uid, displayName, photoURL, timestamp, hash}`. This module
//! checks that assertion, issues a bearer session for it, and announces
//! sign-in / sign-out to subscribers.
//!
//! # Assertion signature
//!
//! - `timestamp` is Unix epoch milliseconds and must be no older than the
//!   configured maximum age and no more than 1 s in the future
//! - `hash` is SHA-256 over the canonical JSON of the assertion (keys sorted,
//!   no whitespace, `hash` replaced by 64 zeros) followed by the shared secret
//!   as a decimal string
//! - The shared secret lives in the `settings` table under
//!   `api_shared_secret`; the value 0 turns verification off

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::edit::EditState;
use crate::{time, uuid_utils, Error, Result};

/// Settings key holding the assertion shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Tolerated clock skew for assertions stamped in the future
pub const MAX_FUTURE_SKEW_MS: i64 = 1000;

/// Default time a session may sit unused before it ends
pub const DEFAULT_SESSION_IDLE_SECS: u32 = 3600;

const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Sign-in and session failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid sign-in assertion: {0}")]
    InvalidAssertion(String),

    #[error("Please sign in first.")]
    MissingSession,

    #[error("Your session has expired. Please sign in again.")]
    UnknownSession,
}

/// A signed-in user as reported by the identity front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl UserIdentity {
    /// First space-separated word of the display name
    pub fn first_name(&self) -> &str {
        self.display_name.split(' ').next().unwrap_or_default()
    }

    pub fn greeting(&self) -> String {
        format!("Hello, {}!", self.first_name())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInAssertion {
    #[serde(flatten)]
    user: UserIdentity,
    timestamp: i64,
    hash: String,
}

// ========================================
// Shared Secret Management
// ========================================

/// Load the assertion shared secret, generating one on first run
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(SHARED_SECRET_KEY)
        .fetch_optional(db)
        .await?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("Invalid {}: {}", SHARED_SECRET_KEY, e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    store_shared_secret(db, secret).await?;
    info!("Generated new sign-in shared secret");
    Ok(secret)
}

/// Overwrite the shared secret (0 disables verification)
pub async fn store_shared_secret(db: &SqlitePool, secret: i64) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(SHARED_SECRET_KEY)
    .bind(secret.to_string())
    .execute(db)
    .await?;
    Ok(())
}

// ========================================
// Assertion Verification
// ========================================

/// Check an assertion timestamp against `now` (both epoch ms)
pub fn validate_timestamp(timestamp: i64, now: i64, max_age_ms: i64) -> std::result::Result<(), AuthError> {
    let diff = now
        .checked_sub(timestamp)
        .ok_or_else(|| AuthError::InvalidTimestamp(format!("{} out of range", timestamp)))?;

    if diff > max_age_ms {
        return Err(AuthError::InvalidTimestamp(format!(
            "{}ms too old (max {}ms past)",
            diff, max_age_ms
        )));
    }

    if diff < -MAX_FUTURE_SKEW_MS {
        return Err(AuthError::InvalidTimestamp(format!(
            "{}ms in future (max {}ms future)",
            diff.unsigned_abs(),
            MAX_FUTURE_SKEW_MS
        )));
    }

    Ok(())
}

/// SHA-256 of the canonical assertion (hash zeroed) plus the shared secret
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let to_hash = format!("{}{}", to_canonical_json(&value), shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// JSON with object keys sorted and no whitespace
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // serde_json's own rendering escapes strings and numbers canonically
        other => other.to_string(),
    }
}

pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> std::result::Result<(), AuthError> {
    if provided_hash != calculate_hash(json_value, shared_secret) {
        return Err(AuthError::InvalidAssertion("hash mismatch".to_string()));
    }
    Ok(())
}

/// Verify a sign-in assertion and extract the user it vouches for
pub fn verify_assertion(
    body: &Value,
    shared_secret: i64,
    max_age_ms: i64,
) -> std::result::Result<UserIdentity, AuthError> {
    let assertion: SignInAssertion = serde_json::from_value(body.clone())
        .map_err(|e| AuthError::InvalidAssertion(e.to_string()))?;

    if assertion.user.uid.is_empty() || assertion.user.uid.contains('/') {
        return Err(AuthError::InvalidAssertion("bad uid".to_string()));
    }

    if shared_secret != 0 {
        validate_timestamp(assertion.timestamp, time::now_millis(), max_age_ms)?;
        validate_hash(&assertion.hash, body, shared_secret)?;
    }

    Ok(assertion.user)
}

// ========================================
// Sessions
// ========================================

/// Announced whenever a session starts or ends
///
/// The session token rides along for in-process subscribers and is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum AuthStateChange {
    SignedIn {
        uid: String,
        #[serde(skip)]
        token: String,
    },
    SignedOut {
        uid: String,
        #[serde(skip)]
        token: String,
    },
}

impl AuthStateChange {
    pub fn uid(&self) -> &str {
        match self {
            AuthStateChange::SignedIn { uid, .. } | AuthStateChange::SignedOut { uid, .. } => uid,
        }
    }

    /// Token of the session the change belongs to
    pub fn token(&self) -> &str {
        match self {
            AuthStateChange::SignedIn { token, .. } | AuthStateChange::SignedOut { token, .. } => {
                token
            }
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuthStateChange::SignedIn { .. } => "SignedIn",
            AuthStateChange::SignedOut { .. } => "SignedOut",
        }
    }
}

/// A bearer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub user: UserIdentity,
    pub signed_in_at: DateTime<Utc>,
}

struct SessionEntry {
    session: Session,
    edit: EditState,
    last_seen: DateTime<Utc>,
}

impl SessionEntry {
    fn is_idle(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        now - self.last_seen > idle_timeout
    }
}

/// Most live sessions one user may hold; signing in past this ends the oldest
pub const MAX_SESSIONS_PER_USER: usize = 16;

/// Live sessions keyed by bearer token
///
/// A session ends on sign-out, after `idle_timeout` without a request, or
/// when its user opens more than [`MAX_SESSIONS_PER_USER`] sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    events: broadcast::Sender<AuthStateChange>,
    idle_timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Duration::seconds(i64::from(DEFAULT_SESSION_IDLE_SECS)))
    }
}

impl SessionManager {
    pub fn new(idle_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            sessions: RwLock::new(HashMap::new()),
            events,
            idle_timeout,
        }
    }

    /// Start a session for a verified user
    ///
    /// Idle sessions are swept first.
    pub async fn sign_in(&self, user: UserIdentity) -> Session {
        let now = time::now();
        let session = Session {
            token: uuid_utils::session_token(),
            user,
            signed_in_at: now,
        };

        let ended = {
            let mut sessions = self.sessions.write().await;

            let mut ended: Vec<String> = sessions
                .iter()
                .filter(|(_, entry)| entry.is_idle(now, self.idle_timeout))
                .map(|(token, _)| token.clone())
                .collect();

            let mut own: Vec<(DateTime<Utc>, String)> = sessions
                .iter()
                .filter(|(token, entry)| {
                    entry.session.user.uid == session.user.uid && !ended.contains(*token)
                })
                .map(|(token, entry)| (entry.session.signed_in_at, token.clone()))
                .collect();
            if own.len() >= MAX_SESSIONS_PER_USER {
                own.sort();
                let excess = own.len() + 1 - MAX_SESSIONS_PER_USER;
                ended.extend(own.into_iter().take(excess).map(|(_, token)| token));
            }

            let ended: Vec<SessionEntry> = ended
                .iter()
                .filter_map(|token| sessions.remove(token))
                .collect();

            sessions.insert(
                session.token.clone(),
                SessionEntry {
                    session: session.clone(),
                    edit: EditState::default(),
                    last_seen: now,
                },
            );
            ended
        };

        for entry in ended {
            info!("Session for user {} ended", entry.session.user.uid);
            self.publish_signed_out(entry.session);
        }

        info!("User {} signed in", session.user.uid);
        self.publish(AuthStateChange::SignedIn {
            uid: session.user.uid.clone(),
            token: session.token.clone(),
        });
        session
    }

    /// End a session; any edit in progress is discarded
    pub async fn sign_out(&self, token: &str) -> std::result::Result<UserIdentity, AuthError> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(token)
            .ok_or(AuthError::UnknownSession)?;

        let user = entry.session.user.clone();
        info!("User {} signed out", user.uid);
        self.publish_signed_out(entry.session);
        Ok(user)
    }

    /// The live session for `token`, marking it as just used
    ///
    /// An idle session is ended and reported as absent.
    pub async fn current(&self, token: &str) -> Option<Session> {
        let now = time::now();
        let mut sessions = self.sessions.write().await;

        if sessions.get(token)?.is_idle(now, self.idle_timeout) {
            let entry = sessions.remove(token)?;
            drop(sessions);
            info!("Session for user {} expired", entry.session.user.uid);
            self.publish_signed_out(entry.session);
            return None;
        }

        let entry = sessions.get_mut(token)?;
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    /// Snapshot of the session's edit state
    pub async fn edit_state(&self, token: &str) -> std::result::Result<EditState, AuthError> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|entry| entry.edit.clone())
            .ok_or(AuthError::UnknownSession)
    }

    /// Run `f` against the session's edit state
    pub async fn with_edit<R>(
        &self,
        token: &str,
        f: impl FnOnce(&mut EditState) -> R,
    ) -> std::result::Result<R, AuthError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(token).ok_or(AuthError::UnknownSession)?;
        Ok(f(&mut entry.edit))
    }

    fn publish_signed_out(&self, session: Session) {
        self.publish(AuthStateChange::SignedOut {
            uid: session.user.uid,
            token: session.token,
        });
    }

    fn publish(&self, change: AuthStateChange) {
        // Err only means nobody is listening
        let _ = self.events.send(change);
    }
}
