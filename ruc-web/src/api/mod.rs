//! HTTP API handlers for ruc-web

pub mod auth;
pub mod buildinfo;
pub mod error;
pub mod health;
pub mod home;
pub mod reviews;
pub mod subjects;

pub use auth::{auth_events, me, require_session, sign_in, sign_out};
pub use buildinfo::get_build_info;
pub use error::{ApiError, ApiResult, Notice};
pub use health::health_routes;
pub use home::{
    begin_edit, cancel_edit, delete_review, get_edit, my_reviews, reconcile_counters, save_edit,
    update_edit,
};
pub use reviews::submit_review;
pub use subjects::{form_options, list_subjects, subject_reviews};
