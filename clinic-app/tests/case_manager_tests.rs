
use std::sync::Arc;

use clinic_app::case_manager::{CaseSource, SelectionPolicy};
use clinic_app::genai::ScriptedModel;
use clinic_core::permanent_cases;
use clinic_persistence::{CaseRepository, ClinicStore};
use test_helpers::*;

#[tokio::test]
async fn test_every_case_has_a_known_origin() {
    let store = ClinicStore::in_memory();
    let cases = CaseRepository::new(store.clone());
    let manager = create_case_manager(
        store,
        Arc::new(ScriptedModel::new(GENERATED_CASE_JSON)),
        SelectionPolicy::default(),
    );
    let permanent_ids: Vec<String> = permanent_cases().into_iter().map(|c| c.id).collect();

    for _ in 0..30 {
        let stored_before: Vec<String> =
            cases.get_all_cases().await.into_iter().map(|c| c.id).collect();

        let served = manager.next_case(500).await;
        let id = served.case.id.clone();
        match served.source {
            CaseSource::Permanent => assert!(permanent_ids.contains(&id)),
            CaseSource::Stored => assert!(stored_before.contains(&id)),
            CaseSource::Generated => {
                assert!(!served.case.is_fallback);
                assert!(cases.get_all_cases().await.iter().any(|c| c.id == id));
            }
        }
        assert!(cases.is_seen(&id).await);
    }
}

#[tokio::test]
async fn test_generated_cases_are_stored_without_images() {
    let store = ClinicStore::in_memory();
    let cases = CaseRepository::new(store.clone());
    let manager = create_case_manager(
        store,
        Arc::new(ScriptedModel::new(GENERATED_CASE_JSON)),
        SelectionPolicy {
            generate_probability: 1.0,
            permanent_bias: 0.0,
        },
    );

    let served = manager.get_next_case(0).await;
    assert!(served.image_url.is_some());
    assert_eq!(served.medical_images.len(), 1);

    let stored = cases.get_all_cases().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, served.id);
    assert!(stored[0].image_url.is_none());
    assert!(stored[0].medical_images.is_empty());
}

#[tokio::test]
async fn test_stored_cases_are_served_once() {
    let store = ClinicStore::in_memory();
    let cases = CaseRepository::new(store.clone());
    let generating = create_case_manager(
        store.clone(),
        Arc::new(ScriptedModel::new(GENERATED_CASE_JSON)),
        SelectionPolicy {
            generate_probability: 1.0,
            permanent_bias: 0.0,
        },
    );
    let generated = generating.get_next_case(0).await;

    // Forget that it was served so the stored pool has one unseen entry
    store
        .set_stored_item(clinic_persistence::SEEN_KEY, &Vec::<String>::new())
        .await;

    let manager = create_case_manager(
        store,
        Arc::new(ScriptedModel::failing()),
        SelectionPolicy {
            generate_probability: 0.0,
            permanent_bias: 0.0,
        },
    )
    .with_permanent_cases(Vec::new());

    let served = manager.next_case(0).await;
    assert_eq!(served.source, CaseSource::Stored);
    assert_eq!(served.case.id, generated.id);

    // Nothing unseen is left, so generation runs and fails over to the fallback
    let next = manager.next_case(0).await;
    assert_eq!(next.source, CaseSource::Generated);
    assert!(next.case.is_fallback);
    assert!(cases.is_seen(&next.case.id).await);
    assert_eq!(cases.get_all_cases().await.len(), 1);
}

#[tokio::test]
async fn test_submit_result_aggregates() {
    let manager = create_case_manager(
        ClinicStore::in_memory(),
        Arc::new(ScriptedModel::failing()),
        NEVER_GENERATE,
    );

    for _ in 0..3 {
        manager.submit_result("perm_002", true).await;
    }
    let stats = manager.submit_result("perm_002", false).await;

    assert_eq!(stats.attempts, 4);
    assert_eq!(stats.correct_count, 3);
    assert!((stats.difficulty_rating - 0.75).abs() < f64::EPSILON);
}
