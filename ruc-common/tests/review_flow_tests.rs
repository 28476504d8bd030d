//! End-to-end review flows: submit, summarize, edit, delete, counter upkeep

use ruc_common::aggregate::letter_grade;
use ruc_common::counter;
use ruc_common::db::models::{CounterRecord, ReviewDraft};
use ruc_common::db::{init_database, paths, DocumentStore};
use ruc_common::edit::EditState;
use ruc_common::identity::UserIdentity;
use ruc_common::reference::{Catalog, Grade};
use ruc_common::reviews::ReviewService;
use ruc_common::validate::ValidationError;
use ruc_common::{time, Error};
use serde_json::json;
use tempfile::TempDir;

async fn setup() -> (TempDir, ReviewService) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("reviews.db")).await.unwrap();
    (dir, ReviewService::new(DocumentStore::new(pool), Catalog::default()))
}

fn user(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        display_name: "Test User".to_string(),
        photo_url: None,
    }
}

fn draft(subject: &str, class: &str, overall: &str, grade: &str) -> ReviewDraft {
    ReviewDraft {
        subject_code: subject.into(),
        class_code: class.into(),
        term: "Fall".into(),
        year: time::current_year().to_string(),
        location: "In person".into(),
        professor: "Menendez".into(),
        review_title: "Fair but demanding".into(),
        review: "Weekly problem sets, two midterms.".into(),
        grade: grade.into(),
        overall_rating: overall.into(),
        difficulty: "4".into(),
        workload: "3".into(),
        take_again: "4".into(),
        professor_rating: "5".into(),
    }
}

async fn counter_value(service: &ReviewService, uid: &str, subject: &str) -> Option<i64> {
    service
        .store()
        .get_document(&paths::reviewed_subject(uid, subject).unwrap())
        .await
        .unwrap()
        .map(|doc| doc.decode::<CounterRecord>().unwrap().review_count)
}

#[tokio::test]
async fn test_first_submission_creates_counter() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");

    let review = service.submit(&u1, &draft("198", "111", "4", "B+")).await.unwrap();
    assert!(!review.id.is_empty());
    assert_eq!(review.user_id, "u1");

    let stored: Vec<_> = service.subject_reviews("198").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], review);
    assert_eq!(counter_value(&service, "u1", "198").await, Some(1));

    let summary = service.subject_summary("198").await.unwrap();
    let class = &summary["111"];
    assert_eq!(class.average_overall_rating, 4.0);
    assert_eq!(class.average_grade_point, 3.5);
    assert_eq!(class.letter_grade(), Grade::BPlus);
}

#[tokio::test]
async fn test_second_submission_increments_counter_and_averages() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");

    service.submit(&u1, &draft("198", "111", "5", "A")).await.unwrap();
    service.submit(&u1, &draft("198", "111", "3", "C")).await.unwrap();

    assert_eq!(counter_value(&service, "u1", "198").await, Some(2));
    let class = &service.subject_summary("198").await.unwrap()["111"];
    assert_eq!(class.average_overall_rating, 4.0);
    assert_eq!(class.average_grade_point, 3.0);
    assert_eq!(letter_grade(class.average_grade_point), Grade::B);
}

#[tokio::test]
async fn test_invalid_submission_writes_nothing() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");

    let mut bad = draft("198", "11a", "4", "B");
    let err = service.submit(&u1, &bad).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidClassCode)));

    bad.class_code = "111".into();
    bad.review = String::new();
    let err = service.submit(&u1, &bad).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::IncompleteFields)));

    assert!(service.subject_reviews("198").await.unwrap().is_empty());
    assert_eq!(counter_value(&service, "u1", "198").await, None);
}

#[tokio::test]
async fn test_unknown_subject_rejected() {
    let (_dir, service) = setup().await;

    let err = service.submit(&user("u1"), &draft("999", "111", "4", "B")).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::InvalidChoice("subjectCode"))
    ));
    assert!(matches!(
        service.subject_summary("999").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_user_reviews_follow_counters() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");
    let u2 = user("u2");

    service.submit(&u1, &draft("198", "111", "4", "B")).await.unwrap();
    service.submit(&u2, &draft("198", "111", "2", "C")).await.unwrap();
    service.submit(&u1, &draft("640", "250", "5", "A")).await.unwrap();

    let mine = service.user_reviews("u1").await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.user_id == "u1"));

    let theirs = service.user_reviews("u2").await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert!(service.user_reviews("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_decrements_then_removes_counter() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");

    let a = service.submit(&u1, &draft("198", "111", "4", "B")).await.unwrap();
    let b = service.submit(&u1, &draft("198", "112", "4", "B")).await.unwrap();

    service.delete("u1", "198", &a.id).await.unwrap();
    assert_eq!(counter_value(&service, "u1", "198").await, Some(1));

    service.delete("u1", "198", &b.id).await.unwrap();
    assert_eq!(counter_value(&service, "u1", "198").await, None);
    assert!(service.subject_reviews("198").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_owner_may_delete_or_edit() {
    let (_dir, service) = setup().await;
    let review = service
        .submit(&user("u1"), &draft("198", "111", "4", "B"))
        .await
        .unwrap();

    assert!(matches!(
        service.delete("u2", "198", &review.id).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        service.load_owned("u2", "198", &review.id).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        service.delete("u1", "198", "missing").await,
        Err(Error::NotFound(_))
    ));
    assert_eq!(service.subject_reviews("198").await.unwrap().len(), 1);
    assert_eq!(counter_value(&service, "u1", "198").await, Some(1));
}

#[tokio::test]
async fn test_edit_keeps_identity_fields() {
    let (_dir, service) = setup().await;
    let original = service
        .submit(&user("u1"), &draft("198", "111", "4", "B"))
        .await
        .unwrap();

    let mut edit = EditState::default();
    edit.begin(&service.load_owned("u1", "198", &original.id).await.unwrap());

    let mut changed = edit.draft().unwrap().clone();
    changed.review_title = "Changed my mind".into();
    changed.overall_rating = "2".into();
    changed.class_code = "999".into();
    changed.subject_code = "640".into();
    edit.replace_draft(changed).unwrap();

    let saved = service.save_edit("u1", &edit.pending().unwrap()).await.unwrap();
    assert_eq!(saved.id, original.id);
    assert_eq!(saved.subject_code, "198");
    assert_eq!(saved.class_code, "111");
    assert_eq!(saved.user_id, "u1");
    assert_eq!(saved.date_posted, original.date_posted);
    assert_eq!(saved.review_title, "Changed my mind");

    let stored = service.subject_reviews("198").await.unwrap();
    assert_eq!(stored, vec![saved]);
    assert_eq!(counter_value(&service, "u1", "198").await, Some(1));
}

#[tokio::test]
async fn test_invalid_edit_leaves_review_unchanged() {
    let (_dir, service) = setup().await;
    let original = service
        .submit(&user("u1"), &draft("198", "111", "4", "B"))
        .await
        .unwrap();

    let mut edit = EditState::default();
    edit.begin(&original);
    let mut changed = edit.draft().unwrap().clone();
    changed.professor = "x".repeat(51);
    edit.replace_draft(changed).unwrap();

    let err = service.save_edit("u1", &edit.pending().unwrap()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Professor name should be no more than 50 characters."
    );
    assert_eq!(service.subject_reviews("198").await.unwrap(), vec![original]);
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_counters() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");
    service.submit(&u1, &draft("198", "111", "4", "B")).await.unwrap();
    service.submit(&u1, &draft("198", "111", "4", "B")).await.unwrap();

    // Knock the counters out of line with the review documents
    let store = service.store();
    store
        .set_document(&paths::reviewed_subject("u1", "198").unwrap(), &json!({"reviewCount": 7}))
        .await
        .unwrap();
    store
        .set_document(&paths::reviewed_subject("u1", "640").unwrap(), &json!({"reviewCount": 1}))
        .await
        .unwrap();

    let drift = service.reconcile_counters("u1").await.unwrap();
    assert_eq!(drift.len(), 2);
    assert!(drift.iter().any(|d| d.subject_code == "198" && d.recorded == 7 && d.actual == 2));
    assert!(drift.iter().any(|d| d.subject_code == "640" && d.recorded == 1 && d.actual == 0));

    assert_eq!(counter_value(&service, "u1", "198").await, Some(2));
    assert_eq!(counter_value(&service, "u1", "640").await, None);
    let mut tx = store.begin().await.unwrap();
    assert!(counter::audit(&mut tx, "u1", service.catalog()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_during_repair_is_not_overwritten() {
    let (_dir, service) = setup().await;
    let u1 = user("u1");
    service.submit(&u1, &draft("198", "111", "4", "B")).await.unwrap();
    let store = service.store();
    store
        .set_document(&paths::reviewed_subject("u1", "198").unwrap(), &json!({"reviewCount": 5}))
        .await
        .unwrap();

    // Hold the repair transaction open while another submission arrives
    let mut tx = store.begin().await.unwrap();
    tx.lock_for_write().await.unwrap();
    let drift = counter::audit(&mut tx, "u1", service.catalog()).await.unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].actual, 1);

    let pending_draft = draft("198", "111", "4", "B");
    let submit = service.submit(&u1, &pending_draft);
    let repair = async {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        counter::repair(&mut tx, "u1", &drift).await?;
        tx.commit().await
    };
    let (submitted, repaired) = tokio::join!(submit, repair);
    submitted.unwrap();
    repaired.unwrap();

    assert_eq!(counter_value(&service, "u1", "198").await, Some(2));
    assert_eq!(service.reconcile_counters("u1").await.unwrap(), vec![]);
}

#[tokio::test]
async fn test_concurrent_submissions_count_exactly() {
    let (_dir, service) = setup().await;
    let service = std::sync::Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.submit(&user("u1"), &draft("198", "111", "3", "B")).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }

    let stored = service.subject_reviews("198").await.unwrap().len() as i64;
    assert_eq!(stored, ok);
    let expected = if ok == 0 { None } else { Some(ok) };
    assert_eq!(counter_value(&service, "u1", "198").await, expected);
}
