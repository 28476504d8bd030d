//! Review flows
//!
//! Submitting, listing, editing and deleting reviews. Every write that
//! changes how many reviews a user has under a subject updates the user's
//! counter in the same transaction, with the review write issued first.

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::aggregate::{aggregate, ClassAggregate};
use crate::counter::{self, CounterDrift};
use crate::db::models::{Review, ReviewDraft};
use crate::db::{paths, Document, DocumentStore};
use crate::edit::PendingEdit;
use crate::identity::UserIdentity;
use crate::reference::Catalog;
use crate::validate::ReviewRules;
use crate::{time, Error, Result};

/// Review operations over the document store
pub struct ReviewService {
    store: DocumentStore,
    catalog: Catalog,
}

fn decode_reviews(docs: Vec<Document>) -> Result<Vec<Review>> {
    docs.iter().map(|doc| doc.decode()).collect()
}

impl ReviewService {
    pub fn new(store: DocumentStore, catalog: Catalog) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn rules(&self) -> ReviewRules<'_> {
        ReviewRules::new(&self.catalog, time::current_year())
    }

    /// Validate and store a new review by `user`; returns it with its id
    pub async fn submit(&self, user: &UserIdentity, draft: &ReviewDraft) -> Result<Review> {
        let content = match self.rules().check(draft) {
            Ok(content) => content,
            Err(e) => {
                warn!("Rejected review from {}: {}", user.uid, e);
                return Err(e.into());
            }
        };
        let mut review = Review::new(content, user.uid.clone(), time::now());

        let mut tx = self.store.begin().await?;
        let id = tx
            .create_document(&paths::reviews(&review.subject_code)?, &review)
            .await?;
        let count = counter::on_create(&mut tx, &user.uid, &review.subject_code).await?;
        tx.commit().await?;

        info!(
            "User {} submitted review {} for {}:{} ({} under subject)",
            user.uid, id, review.subject_code, review.class_code, count
        );
        review.id = id;
        Ok(review)
    }

    /// All reviews filed under a subject, oldest first
    pub async fn subject_reviews(&self, subject_code: &str) -> Result<Vec<Review>> {
        let docs = self
            .store
            .get_collection(&paths::reviews(subject_code)?)
            .await?;
        decode_reviews(docs)
    }

    /// Per-class averages for one subject
    pub async fn subject_summary(&self, subject_code: &str) -> Result<BTreeMap<String, ClassAggregate>> {
        if !self.catalog.contains(subject_code) {
            return Err(Error::NotFound(format!("subject {}", subject_code)));
        }
        Ok(aggregate(self.subject_reviews(subject_code).await?))
    }

    /// The user's own reviews, found through their per-subject counters
    pub async fn user_reviews(&self, uid: &str) -> Result<Vec<Review>> {
        let mut reviews = Vec::new();
        for counter in counter::list(&self.store, uid).await? {
            let docs = self
                .store
                .query_collection(&paths::reviews(&counter.subject_code)?, "userId", uid)
                .await?;
            reviews.extend(decode_reviews(docs)?);
        }
        Ok(reviews)
    }

    /// Load a review that `uid` is allowed to change
    pub async fn load_owned(&self, uid: &str, subject_code: &str, review_id: &str) -> Result<Review> {
        let path = paths::review(subject_code, review_id)?;
        let review: Review = self
            .store
            .get_document(&path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("review {}", path)))?
            .decode()?;

        if !review.is_owned_by(uid) {
            warn!("User {} tried to modify review {} owned by {}", uid, path, review.user_id);
            return Err(Error::Forbidden(format!("review {}", path)));
        }
        Ok(review)
    }

    /// Write an edited draft over its review
    ///
    /// Subject, class code, owner and posting date are kept from the stored
    /// review whatever the draft says.
    pub async fn save_edit(&self, uid: &str, edit: &PendingEdit) -> Result<Review> {
        let existing = self.load_owned(uid, &edit.subject_code, &edit.review_id).await?;

        let mut draft = edit.draft.clone();
        draft.subject_code = existing.subject_code.clone();
        draft.class_code = existing.class_code.clone();
        let content = self.rules().check(&draft)?;

        let mut updated = Review::new(content, existing.user_id.clone(), existing.date_posted);
        self.store
            .update_document(&paths::review(&existing.subject_code, &existing.id)?, &updated)
            .await?;

        info!("User {} updated review {}", uid, existing.id);
        updated.id = existing.id;
        Ok(updated)
    }

    /// Remove one of the user's reviews and count it off their counter
    pub async fn delete(&self, uid: &str, subject_code: &str, review_id: &str) -> Result<()> {
        self.load_owned(uid, subject_code, review_id).await?;
        let path = paths::review(subject_code, review_id)?;

        let mut tx = self.store.begin().await?;
        if !tx.delete_document(&path).await? {
            return Err(Error::NotFound(format!("review {}", path)));
        }
        let remaining = counter::on_delete(&mut tx, uid, subject_code).await?;
        tx.commit().await?;

        info!(
            "User {} deleted review {} ({} left under subject)",
            uid,
            path,
            remaining.unwrap_or(0)
        );
        Ok(())
    }

    /// Bring the user's counters back in line with their reviews
    ///
    /// Audit and repair share one write-locked transaction, so a submit or
    /// delete waits for the repair instead of being overwritten by it.
    pub async fn reconcile_counters(&self, uid: &str) -> Result<Vec<CounterDrift>> {
        let mut tx = self.store.begin().await?;
        tx.lock_for_write().await?;

        let drift = counter::audit(&mut tx, uid, &self.catalog).await?;
        if !drift.is_empty() {
            warn!("User {} has {} drifted review counters", uid, drift.len());
            counter::repair(&mut tx, uid, &drift).await?;
        }
        tx.commit().await?;
        Ok(drift)
    }
}
