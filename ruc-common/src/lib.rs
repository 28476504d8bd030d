//! # RUClasses Common Library
//!
//! Core of the RUClasses course-review service:
//! - Document store over SQLite (`db`)
//! - Review validation, aggregation and rating icons
//! - Per-user review counters and their audit
//! - Sign-in assertions, sessions and edit state
//! - Configuration loading and reference data

pub mod aggregate;
pub mod config;
pub mod counter;
pub mod db;
pub mod edit;
pub mod error;
pub mod identity;
pub mod rating;
pub mod reference;
pub mod reviews;
pub mod sse;
pub mod time;
pub mod uuid_utils;
pub mod validate;

pub use error::{Error, Result};
