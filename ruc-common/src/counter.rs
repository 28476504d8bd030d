//! Per-user "reviews written per subject" counters
//!
//! A counter lives at `users/{uid}/reviewedSubjects/{subjectCode}` and holds
//! `reviewCount`, the number of that user's reviews under the subject. It only
//! exists while the count is positive. Counters are a lookup shortcut; the
//! review documents are the truth, and [`audit`] / [`repair`] rebuild counters
//! from them.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::db::models::{CounterRecord, ReviewedSubjectCounter};
use crate::db::{paths, Document, DocumentStore, DocumentTx};
use crate::reference::Catalog;
use crate::Result;

/// Count one more review by `uid` under `subject_code`; returns the new count
pub async fn on_create(tx: &mut DocumentTx, uid: &str, subject_code: &str) -> Result<i64> {
    let path = paths::reviewed_subject(uid, subject_code)?;

    match tx.get_document(&path).await? {
        Some(doc) => {
            let record: CounterRecord = doc.decode()?;
            let review_count = record.review_count + 1;
            tx.update_document(&path, &CounterRecord { review_count })
                .await?;
            Ok(review_count)
        }
        None => {
            tx.set_document(&path, &CounterRecord { review_count: 1 })
                .await?;
            Ok(1)
        }
    }
}

/// Count one review fewer; the counter is removed instead of reaching zero
///
/// Returns the remaining count, or `None` when no counter is left.
pub async fn on_delete(tx: &mut DocumentTx, uid: &str, subject_code: &str) -> Result<Option<i64>> {
    let path = paths::reviewed_subject(uid, subject_code)?;

    let Some(doc) = tx.get_document(&path).await? else {
        warn!(
            "No review counter for user {} subject {} on delete",
            uid, subject_code
        );
        return Ok(None);
    };

    let record: CounterRecord = doc.decode()?;
    let review_count = record.review_count - 1;
    if review_count > 0 {
        tx.update_document(&path, &CounterRecord { review_count })
            .await?;
        Ok(Some(review_count))
    } else {
        tx.delete_document(&path).await?;
        Ok(None)
    }
}

/// Every counter the user has, in store order
pub async fn list(store: &DocumentStore, uid: &str) -> Result<Vec<ReviewedSubjectCounter>> {
    decode_counters(store.get_collection(&paths::reviewed_subjects(uid)?).await?)
}

fn decode_counters(docs: Vec<Document>) -> Result<Vec<ReviewedSubjectCounter>> {
    docs.iter().map(|doc| doc.decode()).collect()
}

/// A counter that disagrees with the review documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub subject_code: String,
    /// Value in the counter document (0 when there is none)
    pub recorded: i64,
    /// Number of review documents the user actually has under the subject
    pub actual: i64,
}

/// Compare the user's counters against their review documents
///
/// Looks at every catalog subject plus any subject that already has a counter.
/// Run it in the same transaction as [`repair`], after
/// [`DocumentTx::lock_for_write`], so no review commits in between.
pub async fn audit(tx: &mut DocumentTx, uid: &str, catalog: &Catalog) -> Result<Vec<CounterDrift>> {
    let counters = decode_counters(tx.get_collection(&paths::reviewed_subjects(uid)?).await?)?;

    let mut subjects: BTreeSet<&str> = catalog.subjects().iter().map(|s| s.code.as_str()).collect();
    subjects.extend(counters.iter().map(|c| c.subject_code.as_str()));

    let mut drift = Vec::new();
    for subject_code in subjects {
        let actual = tx
            .query_collection(&paths::reviews(subject_code)?, "userId", uid)
            .await?
            .len() as i64;
        let recorded = counters
            .iter()
            .find(|c| c.subject_code == subject_code)
            .map(|c| c.review_count)
            .unwrap_or(0);

        if actual != recorded {
            drift.push(CounterDrift {
                subject_code: subject_code.to_string(),
                recorded,
                actual,
            });
        }
    }

    Ok(drift)
}

/// Rewrite drifted counters to their actual values
pub async fn repair(tx: &mut DocumentTx, uid: &str, drift: &[CounterDrift]) -> Result<()> {
    for entry in drift {
        let path = paths::reviewed_subject(uid, &entry.subject_code)?;
        if entry.actual > 0 {
            tx.set_document(
                &path,
                &CounterRecord {
                    review_count: entry.actual,
                },
            )
            .await?;
        } else {
            tx.delete_document(&path).await?;
        }
        info!(
            "Repaired review counter for user {} subject {}: {} -> {}",
            uid, entry.subject_code, entry.recorded, entry.actual
        );
    }
    Ok(())
}
