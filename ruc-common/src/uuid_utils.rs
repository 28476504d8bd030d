//! Identifier generation

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Fresh document id (32 lowercase hex characters)
pub fn document_id() -> String {
    generate().simple().to_string()
}

/// Fresh bearer token for a signed-in session
pub fn session_token() -> String {
    generate().to_string()
}
