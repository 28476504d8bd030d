//! Storage gateway: SQLite-backed document store, paths, and document models

pub mod documents;
pub mod init;
pub mod models;
pub mod paths;

pub use documents::{Document, DocumentStore, DocumentTx};
pub use init::init_database;
pub use models::*;
pub use paths::{CollectionPath, DocumentPath};
