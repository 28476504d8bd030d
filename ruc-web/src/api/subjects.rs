//! Subject browsing
//!
//! Public read endpoints: the subject catalog, the form option lists, and a
//! subject's reviews summarized per class.

use axum::{
    extract::{Path, State},
    Json,
};
use ruc_common::aggregate::ClassAggregate;
use ruc_common::db::models::Review;
use ruc_common::rating::{IconView, SentimentIcon};
use ruc_common::reference::{FormOptions, Grade, Subject};
use ruc_common::{time, Error};
use serde::Serialize;

use super::error::ApiResult;
use crate::AppState;

/// GET /api/subjects
pub async fn list_subjects(State(state): State<AppState>) -> Json<Vec<Subject>> {
    Json(state.reviews.catalog().subjects().to_vec())
}

/// GET /api/options - grades, terms, years, locations and ratings
pub async fn form_options() -> Json<FormOptions> {
    Json(FormOptions::for_year(time::current_year()))
}

/// Icons for one review's ratings; `None` where the stored value is not 1..5
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIcons {
    pub overall_rating: Option<IconView>,
    pub difficulty: Option<IconView>,
    pub workload: Option<IconView>,
    pub take_again: Option<IconView>,
    pub professor_rating: Option<IconView>,
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub icons: ReviewIcons,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        let icon = |value: &str| SentimentIcon::from_rating(value).map(IconView::from);
        let icons = ReviewIcons {
            overall_rating: icon(&review.overall_rating),
            difficulty: icon(&review.difficulty),
            workload: icon(&review.workload),
            take_again: icon(&review.take_again),
            professor_rating: icon(&review.professor_rating),
        };
        Self { review, icons }
    }
}

/// Icons for a class's rounded averages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageIcons {
    pub overall_rating: Option<IconView>,
    pub difficulty: Option<IconView>,
    pub workload: Option<IconView>,
    pub take_again: Option<IconView>,
}

/// One class row of a subject page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_code: String,
    pub average_overall_rating: f64,
    pub average_difficulty: f64,
    pub average_workload: f64,
    pub average_take_again: f64,
    pub average_grade_point: f64,
    pub letter_grade: Grade,
    pub icons: AverageIcons,
    pub reviews: Vec<ReviewView>,
}

impl ClassSummary {
    fn new(class_code: String, class: ClassAggregate) -> Self {
        let icon = |average: f64| SentimentIcon::from_average(average).map(IconView::from);
        Self {
            class_code,
            letter_grade: class.letter_grade(),
            icons: AverageIcons {
                overall_rating: icon(class.average_overall_rating),
                difficulty: icon(class.average_difficulty),
                workload: icon(class.average_workload),
                take_again: icon(class.average_take_again),
            },
            average_overall_rating: class.average_overall_rating,
            average_difficulty: class.average_difficulty,
            average_workload: class.average_workload,
            average_take_again: class.average_take_again,
            average_grade_point: class.average_grade_point,
            reviews: class.reviews.into_iter().map(ReviewView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubjectPage {
    pub subject: Subject,
    pub classes: Vec<ClassSummary>,
}

/// GET /api/subjects/:code/reviews
///
/// Classes come back ordered by class code.
pub async fn subject_reviews(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<SubjectPage>> {
    let subject = state
        .reviews
        .catalog()
        .get(&code)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("subject {}", code)))?;

    let classes = state
        .reviews
        .subject_summary(&code)
        .await?
        .into_iter()
        .map(|(class_code, class)| ClassSummary::new(class_code, class))
        .collect();

    Ok(Json(SubjectPage { subject, classes }))
}
