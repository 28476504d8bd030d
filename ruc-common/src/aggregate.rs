//! Per-class rating summaries
//!
//! Groups one subject's reviews by class code and averages the four class
//! ratings and the grade points. Summaries are recomputed from the review
//! documents on every read.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::Review;
use crate::reference::Grade;

/// Letter-grade bands over average grade points, checked high to low.
/// Each breakpoint sits halfway between two adjacent grade-point values.
const LETTER_BANDS: [(f64, Grade); 6] = [
    (3.75, Grade::A),
    (3.25, Grade::BPlus),
    (2.75, Grade::B),
    (2.25, Grade::CPlus),
    (1.75, Grade::C),
    (0.75, Grade::D),
];

/// Averages for one class code within a subject
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAggregate {
    pub average_overall_rating: f64,
    pub average_difficulty: f64,
    pub average_workload: f64,
    pub average_take_again: f64,
    pub average_grade_point: f64,
    pub reviews: Vec<Review>,
}

impl ClassAggregate {
    /// Letter grade for this class's average grade point
    pub fn letter_grade(&self) -> Grade {
        letter_grade(self.average_grade_point)
    }
}

#[derive(Default)]
struct ClassTotals {
    overall_rating: f64,
    difficulty: f64,
    workload: f64,
    take_again: f64,
    grade_points: f64,
    count: usize,
    reviews: Vec<Review>,
}

impl ClassTotals {
    fn add(&mut self, review: Review) {
        self.overall_rating += rating_value(&review.overall_rating);
        self.difficulty += rating_value(&review.difficulty);
        self.workload += rating_value(&review.workload);
        self.take_again += rating_value(&review.take_again);
        self.grade_points += review.grade.points();
        self.count += 1;
        self.reviews.push(review);
    }

    fn finish(self) -> ClassAggregate {
        let n = self.count as f64;
        ClassAggregate {
            average_overall_rating: self.overall_rating / n,
            average_difficulty: self.difficulty / n,
            average_workload: self.workload / n,
            average_take_again: self.take_again / n,
            average_grade_point: self.grade_points / n,
            reviews: self.reviews,
        }
    }
}

/// A stored rating as a number; NaN when it is not an integer
fn rating_value(value: &str) -> f64 {
    value
        .trim()
        .parse::<i64>()
        .map(|v| v as f64)
        .unwrap_or(f64::NAN)
}

/// Group reviews by class code and average each group
///
/// Every input review lands in exactly one group. No input, no groups.
pub fn aggregate<I>(reviews: I) -> BTreeMap<String, ClassAggregate>
where
    I: IntoIterator<Item = Review>,
{
    let mut totals: BTreeMap<String, ClassTotals> = BTreeMap::new();
    for review in reviews {
        totals
            .entry(review.class_code.clone())
            .or_default()
            .add(review);
    }

    totals
        .into_iter()
        .map(|(class_code, t)| (class_code, t.finish()))
        .collect()
}

/// Re-bucket an average grade point into a letter grade (NaN gives F)
pub fn letter_grade(average_grade_point: f64) -> Grade {
    LETTER_BANDS
        .iter()
        .find(|(floor, _)| average_grade_point >= *floor)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Location, Term};
    use chrono::Utc;

    fn review(id: &str, class_code: &str, ratings: [&str; 4], grade: Grade) -> Review {
        Review {
            id: id.to_string(),
            subject_code: "198".into(),
            class_code: class_code.into(),
            term: Term::Spring,
            year: 2025,
            location: Location::Online,
            professor: "Prof".into(),
            review_title: "Title".into(),
            review: "Body".into(),
            grade,
            overall_rating: ratings[0].into(),
            difficulty: ratings[1].into(),
            workload: ratings[2].into(),
            take_again: ratings[3].into(),
            professor_rating: "3".into(),
            user_id: "u1".into(),
            date_posted: Utc::now(),
        }
    }

    #[test]
    fn test_empty_input_empty_map() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_review_averages_equal_ratings() {
        let result = aggregate(vec![review("r1", "101", ["4", "4", "4", "4"], Grade::BPlus)]);
        assert_eq!(result.len(), 1);

        let class = &result["101"];
        assert_eq!(class.average_overall_rating, 4.0);
        assert_eq!(class.average_difficulty, 4.0);
        assert_eq!(class.average_workload, 4.0);
        assert_eq!(class.average_take_again, 4.0);
        assert_eq!(class.average_grade_point, 3.5);
        assert_eq!(class.letter_grade(), Grade::BPlus);
    }

    #[test]
    fn test_two_reviews_average() {
        let result = aggregate(vec![
            review("r1", "111", ["5", "2", "1", "5"], Grade::A),
            review("r2", "111", ["3", "4", "2", "4"], Grade::C),
        ]);
        let class = &result["111"];
        assert_eq!(class.average_overall_rating, 4.0);
        assert_eq!(class.average_difficulty, 3.0);
        assert_eq!(class.average_workload, 1.5);
        assert_eq!(class.average_take_again, 4.5);
        assert_eq!(class.average_grade_point, 3.0);
        assert_eq!(class.letter_grade(), Grade::B);
        assert_eq!(class.reviews.len(), 2);
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let input = vec![
            review("a", "111", ["1", "1", "1", "1"], Grade::F),
            review("b", "205", ["2", "2", "2", "2"], Grade::D),
            review("c", "111", ["3", "3", "3", "3"], Grade::C),
            review("d", "344", ["4", "4", "4", "4"], Grade::B),
            review("e", "205", ["5", "5", "5", "5"], Grade::P),
            review("f", "011", ["5", "1", "3", "2"], Grade::W),
        ];
        let result = aggregate(input.clone());

        assert_eq!(result.len(), 4);
        let mut seen: Vec<String> = result
            .iter()
            .flat_map(|(code, class)| {
                class.reviews.iter().map(move |r| {
                    assert_eq!(&r.class_code, code);
                    r.id.clone()
                })
            })
            .collect();
        seen.sort();
        let mut expected: Vec<String> = input.iter().map(|r| r.id.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_averages_within_member_bounds() {
        let input = vec![
            review("a", "111", ["1", "5", "2", "3"], Grade::A),
            review("b", "111", ["4", "2", "2", "5"], Grade::W),
            review("c", "111", ["2", "3", "5", "1"], Grade::CPlus),
        ];
        let class = &aggregate(input.clone())["111"];

        let bounds = |f: fn(&Review) -> f64| {
            let values: Vec<f64> = input.iter().map(f).collect();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (min, max)
        };
        let checks: [(f64, fn(&Review) -> f64); 5] = [
            (class.average_overall_rating, |r| rating_value(&r.overall_rating)),
            (class.average_difficulty, |r| rating_value(&r.difficulty)),
            (class.average_workload, |r| rating_value(&r.workload)),
            (class.average_take_again, |r| rating_value(&r.take_again)),
            (class.average_grade_point, |r| r.grade.points()),
        ];
        for (average, field) in checks {
            let (min, max) = bounds(field);
            assert!(average >= min && average <= max, "{average} not in [{min}, {max}]");
        }
    }

    #[test]
    fn test_letter_grade_breakpoints() {
        assert_eq!(letter_grade(4.0), Grade::A);
        assert_eq!(letter_grade(3.75), Grade::A);
        assert_eq!(letter_grade(3.74), Grade::BPlus);
        assert_eq!(letter_grade(3.25), Grade::BPlus);
        assert_eq!(letter_grade(3.24), Grade::B);
        assert_eq!(letter_grade(2.75), Grade::B);
        assert_eq!(letter_grade(2.74), Grade::CPlus);
        assert_eq!(letter_grade(2.25), Grade::CPlus);
        assert_eq!(letter_grade(2.24), Grade::C);
        assert_eq!(letter_grade(1.75), Grade::C);
        assert_eq!(letter_grade(1.74), Grade::D);
        assert_eq!(letter_grade(0.75), Grade::D);
        assert_eq!(letter_grade(0.74), Grade::F);
        assert_eq!(letter_grade(0.0), Grade::F);
        assert_eq!(letter_grade(f64::NAN), Grade::F);
    }

    #[test]
    fn test_letter_grade_monotonic() {
        let mut previous = letter_grade(0.0).points();
        for step in 0..=400 {
            let gp = step as f64 / 100.0;
            let points = letter_grade(gp).points();
            assert!(points >= previous, "letter grade dropped at {gp}");
            previous = points;
        }
    }

    #[test]
    fn test_unparseable_rating_poisons_only_its_average() {
        let result = aggregate(vec![
            review("a", "111", ["", "3", "3", "3"], Grade::B),
            review("b", "111", ["4", "3", "3", "3"], Grade::B),
        ]);
        let class = &result["111"];
        assert!(class.average_overall_rating.is_nan());
        assert_eq!(class.average_difficulty, 3.0);

        let json = serde_json::to_value(class).unwrap();
        assert!(json["averageOverallRating"].is_null());
        assert_eq!(json["averageDifficulty"], 3.0);
    }
}
