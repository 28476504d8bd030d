//! Collection and document paths
//!
//! Paths alternate collection and document segments:
//! `subjects/{subjectCode}/reviews` is a collection,
//! `subjects/{subjectCode}/reviews/{reviewId}` a document in it.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Path naming a collection (odd number of segments)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Path naming one document (even number of segments)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(Error::InvalidPath(format!("bad path segment {:?}", segment)));
    }
    Ok(())
}

impl CollectionPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document `id` inside this collection
    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        check_segment(id)?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }
}

impl DocumentPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FromStr for CollectionPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() % 2 == 0 {
            return Err(Error::InvalidPath(format!("{} is not a collection path", s)));
        }
        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(CollectionPath(s.to_string()))
    }
}

impl FromStr for DocumentPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (collection, id) = s
            .rsplit_once('/')
            .ok_or_else(|| Error::InvalidPath(format!("{} is not a document path", s)))?;
        collection.parse::<CollectionPath>()?.doc(id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// `subjects/{subject_code}/reviews`
pub fn reviews(subject_code: &str) -> Result<CollectionPath> {
    check_segment(subject_code)?;
    format!("subjects/{}/reviews", subject_code).parse()
}

/// `subjects/{subject_code}/reviews/{review_id}`
pub fn review(subject_code: &str, review_id: &str) -> Result<DocumentPath> {
    reviews(subject_code)?.doc(review_id)
}

/// `users/{uid}/reviewedSubjects`
pub fn reviewed_subjects(uid: &str) -> Result<CollectionPath> {
    check_segment(uid)?;
    format!("users/{}/reviewedSubjects", uid).parse()
}

/// `users/{uid}/reviewedSubjects/{subject_code}`
pub fn reviewed_subject(uid: &str, subject_code: &str) -> Result<DocumentPath> {
    reviewed_subjects(uid)?.doc(subject_code)
}
