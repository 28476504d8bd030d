//! Review draft validation
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. every field present and non-empty
//! 2. class code is exactly three ASCII digits (leading zeros allowed)
//! 3. professor, review title, review text within their length limits
//! 4. choice fields hold one of the offered options
//!
//! Lengths are counted in characters, not bytes.

use std::fmt;
use thiserror::Error;

use crate::db::models::{ReviewContent, ReviewDraft};
use crate::reference::{year_options, Catalog, Grade, Location, Term};

pub const PROFESSOR_MAX_LEN: usize = 50;
pub const REVIEW_TITLE_MAX_LEN: usize = 125;
pub const REVIEW_MAX_LEN: usize = 750;

/// Free-text fields with an upper length bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedField {
    Professor,
    ReviewTitle,
    Review,
}

impl LimitedField {
    pub fn max_len(&self) -> usize {
        match self {
            LimitedField::Professor => PROFESSOR_MAX_LEN,
            LimitedField::ReviewTitle => REVIEW_TITLE_MAX_LEN,
            LimitedField::Review => REVIEW_MAX_LEN,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LimitedField::Professor => "Professor name",
            LimitedField::ReviewTitle => "Review title",
            LimitedField::Review => "Review",
        }
    }
}

impl fmt::Display for LimitedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LimitedField::Professor => "professor",
            LimitedField::ReviewTitle => "reviewTitle",
            LimitedField::Review => "review",
        })
    }
}

/// Draft rejected; the message is what the user sees
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill out all fields.")]
    IncompleteFields,

    #[error("Class Code should be exactly 3 digits.")]
    InvalidClassCode,

    #[error("{} should be no more than {} characters.", .0.label(), .0.max_len())]
    FieldTooLong(LimitedField),

    /// Field value is not one of the offered options (camelCase field name)
    #[error("Please choose a valid {0}.")]
    InvalidChoice(&'static str),
}

/// Completeness, class code format, then length limits
pub fn validate(draft: &ReviewDraft) -> Result<(), ValidationError> {
    let required = [
        &draft.subject_code,
        &draft.class_code,
        &draft.term,
        &draft.year,
        &draft.location,
        &draft.professor,
        &draft.review_title,
        &draft.review,
        &draft.grade,
        &draft.overall_rating,
        &draft.difficulty,
        &draft.workload,
        &draft.take_again,
        &draft.professor_rating,
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err(ValidationError::IncompleteFields);
    }

    if !is_class_code(&draft.class_code) {
        return Err(ValidationError::InvalidClassCode);
    }

    for (field, value) in [
        (LimitedField::Professor, &draft.professor),
        (LimitedField::ReviewTitle, &draft.review_title),
        (LimitedField::Review, &draft.review),
    ] {
        if value.chars().count() > field.max_len() {
            return Err(ValidationError::FieldTooLong(field));
        }
    }

    Ok(())
}

/// Three ASCII digits; "007" is fine, "1.5" and "12" are not
pub fn is_class_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
}

/// True for the five rating levels "1".."5"
pub fn is_rating(value: &str) -> bool {
    matches!(value, "1" | "2" | "3" | "4" | "5")
}

/// Full validation against the deployment's reference data
///
/// Runs [`validate`] first, then checks every choice field against the
/// catalog and option lists, and returns the typed content.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRules<'a> {
    catalog: &'a Catalog,
    current_year: i32,
}

impl<'a> ReviewRules<'a> {
    pub fn new(catalog: &'a Catalog, current_year: i32) -> Self {
        Self {
            catalog,
            current_year,
        }
    }

    pub fn check(&self, draft: &ReviewDraft) -> Result<ReviewContent, ValidationError> {
        validate(draft)?;

        if !self.catalog.contains(&draft.subject_code) {
            return Err(ValidationError::InvalidChoice("subjectCode"));
        }
        let term: Term = draft
            .term
            .parse()
            .map_err(|_| ValidationError::InvalidChoice("term"))?;
        let year: i32 = draft
            .year
            .trim()
            .parse()
            .ok()
            .filter(|y| year_options(self.current_year).contains(y))
            .ok_or(ValidationError::InvalidChoice("year"))?;
        let location: Location = draft
            .location
            .parse()
            .map_err(|_| ValidationError::InvalidChoice("location"))?;
        let grade: Grade = draft
            .grade
            .parse()
            .map_err(|_| ValidationError::InvalidChoice("grade"))?;

        for (name, value) in [
            ("overallRating", &draft.overall_rating),
            ("difficulty", &draft.difficulty),
            ("workload", &draft.workload),
            ("takeAgain", &draft.take_again),
            ("professorRating", &draft.professor_rating),
        ] {
            if !is_rating(value) {
                return Err(ValidationError::InvalidChoice(name));
            }
        }

        Ok(ReviewContent {
            subject_code: draft.subject_code.clone(),
            class_code: draft.class_code.clone(),
            term,
            year,
            location,
            professor: draft.professor.clone(),
            review_title: draft.review_title.clone(),
            review: draft.review.clone(),
            grade,
            overall_rating: draft.overall_rating.clone(),
            difficulty: draft.difficulty.clone(),
            workload: draft.workload.clone(),
            take_again: draft.take_again.clone(),
            professor_rating: draft.professor_rating.clone(),
        })
    }
}
