//! Document models
//!
//! Shapes of the documents kept in the store. Field names are camelCase on
//! the wire and at rest so stored documents read the same as API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::reference::{Grade, Location, Term};

/// A stored class review
///
/// Ratings stay as the strings "1".."5" they were submitted as; display code
/// parses them and degrades to "no icon" for anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Assigned by the store; never part of the stored body
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub subject_code: String,
    pub class_code: String,
    pub term: Term,
    pub year: i32,
    pub location: Location,
    pub professor: String,
    pub review_title: String,
    pub review: String,
    pub grade: Grade,
    pub overall_rating: String,
    pub difficulty: String,
    pub workload: String,
    pub take_again: String,
    pub professor_rating: String,
    pub user_id: String,
    pub date_posted: DateTime<Utc>,
}

impl Review {
    /// Build a review from validated content, owned by `user_id`
    pub fn new(content: ReviewContent, user_id: impl Into<String>, date_posted: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            subject_code: content.subject_code,
            class_code: content.class_code,
            term: content.term,
            year: content.year,
            location: content.location,
            professor: content.professor,
            review_title: content.review_title,
            review: content.review,
            grade: content.grade,
            overall_rating: content.overall_rating,
            difficulty: content.difficulty,
            workload: content.workload,
            take_again: content.take_again,
            professor_rating: content.professor_rating,
            user_id: user_id.into(),
            date_posted,
        }
    }

    /// Editable working copy of this review
    pub fn to_draft(&self) -> ReviewDraft {
        ReviewDraft {
            subject_code: self.subject_code.clone(),
            class_code: self.class_code.clone(),
            term: self.term.to_string(),
            year: self.year.to_string(),
            location: self.location.to_string(),
            professor: self.professor.clone(),
            review_title: self.review_title.clone(),
            review: self.review.clone(),
            grade: self.grade.to_string(),
            overall_rating: self.overall_rating.clone(),
            difficulty: self.difficulty.clone(),
            workload: self.workload.clone(),
            take_again: self.take_again.clone(),
            professor_rating: self.professor_rating.clone(),
        }
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.user_id == uid
    }
}

/// Review form contents as typed by the user
///
/// Every field is free text until validated. Missing fields deserialize as
/// empty strings so the validator can report them as incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewDraft {
    pub subject_code: String,
    pub class_code: String,
    pub term: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    pub location: String,
    pub professor: String,
    pub review_title: String,
    pub review: String,
    pub grade: String,
    #[serde(deserialize_with = "string_or_number")]
    pub overall_rating: String,
    #[serde(deserialize_with = "string_or_number")]
    pub difficulty: String,
    #[serde(deserialize_with = "string_or_number")]
    pub workload: String,
    #[serde(deserialize_with = "string_or_number")]
    pub take_again: String,
    #[serde(deserialize_with = "string_or_number")]
    pub professor_rating: String,
}

/// Validated, typed review content (everything but identity and provenance)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContent {
    pub subject_code: String,
    pub class_code: String,
    pub term: Term,
    pub year: i32,
    pub location: Location,
    pub professor: String,
    pub review_title: String,
    pub review: String,
    pub grade: Grade,
    pub overall_rating: String,
    pub difficulty: String,
    pub workload: String,
    pub take_again: String,
    pub professor_rating: String,
}

/// Per-user count of reviews written under one subject
///
/// Stored at `users/{uid}/reviewedSubjects/{subjectCode}`; the subject code is
/// the document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedSubjectCounter {
    #[serde(rename = "id")]
    pub subject_code: String,
    pub review_count: i64,
}

/// Body of a counter document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub review_count: i64,
}

/// Form selects send numbers; text inputs send strings. Accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_accepts_numeric_year_and_ratings() {
        let draft: ReviewDraft = serde_json::from_value(json!({
            "subjectCode": "198",
            "year": 2024,
            "overallRating": 4,
            "difficulty": "3"
        }))
        .unwrap();

        assert_eq!(draft.year, "2024");
        assert_eq!(draft.overall_rating, "4");
        assert_eq!(draft.difficulty, "3");
        assert_eq!(draft.workload, "");
        assert_eq!(draft.class_code, "");
    }

    #[test]
    fn test_draft_null_is_empty() {
        let draft: ReviewDraft = serde_json::from_value(json!({ "year": null })).unwrap();
        assert_eq!(draft.year, "");
    }

    #[test]
    fn test_review_body_omits_empty_id() {
        let review = Review {
            id: String::new(),
            subject_code: "198".into(),
            class_code: "111".into(),
            term: Term::Fall,
            year: 2024,
            location: Location::InPerson,
            professor: "Prof".into(),
            review_title: "Title".into(),
            review: "Text".into(),
            grade: Grade::BPlus,
            overall_rating: "4".into(),
            difficulty: "3".into(),
            workload: "2".into(),
            take_again: "5".into(),
            professor_rating: "4".into(),
            user_id: "u1".into(),
            date_posted: Utc::now(),
        };

        let value = serde_json::to_value(&review).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["grade"], "B+");
        assert_eq!(value["location"], "In person");
        assert_eq!(value["userId"], "u1");

        let draft = review.to_draft();
        assert_eq!(draft.year, "2024");
        assert_eq!(draft.grade, "B+");
        assert_eq!(draft.term, "Fall");
    }
}
