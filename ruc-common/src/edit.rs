//! Per-session edit state
//!
//! At most one review is being edited per session. Starting a new edit
//! replaces whatever was in progress.

use serde::Serialize;

use crate::db::models::{Review, ReviewDraft};
use crate::{Error, Result};

/// The review currently open for editing, with its working copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditState {
    active_edit_id: Option<String>,
    subject_code: Option<String>,
    draft: Option<ReviewDraft>,
}

/// What a save needs to know about the open edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub subject_code: String,
    pub review_id: String,
    pub draft: ReviewDraft,
}

impl EditState {
    /// Open `review` for editing, seeding the draft from its stored values
    pub fn begin(&mut self, review: &Review) {
        self.active_edit_id = Some(review.id.clone());
        self.subject_code = Some(review.subject_code.clone());
        self.draft = Some(review.to_draft());
    }

    pub fn active_edit_id(&self) -> Option<&str> {
        self.active_edit_id.as_deref()
    }

    pub fn draft(&self) -> Option<&ReviewDraft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.active_edit_id.is_some()
    }

    /// Replace the working copy of the open edit
    pub fn replace_draft(&mut self, draft: ReviewDraft) -> Result<()> {
        if !self.is_editing() {
            return Err(Error::NotFound("No review is being edited".to_string()));
        }
        self.draft = Some(draft);
        Ok(())
    }

    /// The open edit, if any, without closing it
    pub fn pending(&self) -> Option<PendingEdit> {
        match (&self.active_edit_id, &self.subject_code, &self.draft) {
            (Some(review_id), Some(subject_code), Some(draft)) => Some(PendingEdit {
                subject_code: subject_code.clone(),
                review_id: review_id.clone(),
                draft: draft.clone(),
            }),
            _ => None,
        }
    }

    /// Close the edit without saving
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Grade, Location, Term};
    use chrono::Utc;

    fn stored_review(id: &str) -> Review {
        Review {
            id: id.to_string(),
            subject_code: "198".into(),
            class_code: "111".into(),
            term: Term::Fall,
            year: 2024,
            location: Location::InPerson,
            professor: "Smith".into(),
            review_title: "Solid intro".into(),
            review: "Lots of practice.".into(),
            grade: Grade::A,
            overall_rating: "5".into(),
            difficulty: "3".into(),
            workload: "4".into(),
            take_again: "5".into(),
            professor_rating: "4".into(),
            user_id: "u1".into(),
            date_posted: Utc::now(),
        }
    }

    #[test]
    fn test_begin_seeds_draft() {
        let mut state = EditState::default();
        assert!(!state.is_editing());

        state.begin(&stored_review("r1"));
        assert_eq!(state.active_edit_id(), Some("r1"));
        let draft = state.draft().unwrap();
        assert_eq!(draft.year, "2024");
        assert_eq!(draft.location, "In person");
        assert_eq!(draft.review_title, "Solid intro");
    }

    #[test]
    fn test_begin_replaces_previous_edit() {
        let mut state = EditState::default();
        state.begin(&stored_review("r1"));
        state.begin(&stored_review("r2"));

        let pending = state.pending().unwrap();
        assert_eq!(pending.review_id, "r2");
        assert_eq!(pending.subject_code, "198");
    }

    #[test]
    fn test_replace_draft_requires_open_edit() {
        let mut state = EditState::default();
        assert!(state.replace_draft(ReviewDraft::default()).is_err());

        state.begin(&stored_review("r1"));
        let mut draft = state.draft().unwrap().clone();
        draft.professor = "Jones".into();
        state.replace_draft(draft).unwrap();
        assert_eq!(state.pending().unwrap().draft.professor, "Jones");
    }

    #[test]
    fn test_cancel_clears_everything() {
        let mut state = EditState::default();
        state.begin(&stored_review("r1"));
        state.cancel();
        assert_eq!(state, EditState::default());
        assert!(state.pending().is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut state = EditState::default();
        state.begin(&stored_review("r1"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["activeEditId"], "r1");
        assert_eq!(json["subjectCode"], "198");
        assert_eq!(json["draft"]["classCode"], "111");
    }
}
