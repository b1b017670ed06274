use tracing::{debug, info};

use crate::store::{CASES_KEY, ClinicStore, SEEN_KEY};
use clinic_types::{CaseId, PatientCase};

/// Generated cases kept on disk; the oldest go first.
pub const MAX_STORED_CASES: usize = 50;

#[derive(Clone)]
pub struct CaseRepository {
    store: ClinicStore,
}

impl CaseRepository {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    pub async fn get_all_cases(&self) -> Vec<PatientCase> {
        self.store.get_stored_item(CASES_KEY, Vec::new()).await
    }

    pub async fn save_case(&self, case: &PatientCase) {
        if case.is_fallback {
            debug!("Not storing fallback case {}", case.id);
            return;
        }

        let mut cases = self.get_all_cases().await;
        if cases.iter().any(|stored| stored.id == case.id) {
            return;
        }

        cases.push(case.without_image_payloads());
        if cases.len() > MAX_STORED_CASES {
            let excess = cases.len() - MAX_STORED_CASES;
            cases.drain(..excess);
            info!("Evicted {} old case(s)", excess);
        }

        self.store.set_stored_item(CASES_KEY, &cases).await;
    }

    pub async fn get_seen_ids(&self) -> Vec<CaseId> {
        self.store.get_stored_item(SEEN_KEY, Vec::new()).await
    }

    pub async fn is_seen(&self, case_id: &str) -> bool {
        self.get_seen_ids().await.iter().any(|id| id == case_id)
    }

    pub async fn mark_seen(&self, case_id: &str) {
        let mut seen = self.get_seen_ids().await;
        if seen.iter().any(|id| id == case_id) {
            return;
        }
        seen.push(case_id.to_string());
        self.store.set_stored_item(SEEN_KEY, &seen).await;
    }

    /// Stored cases that have not been served yet.
    pub async fn get_unseen_cases(&self) -> Vec<PatientCase> {
        let seen = self.get_seen_ids().await;
        self.get_all_cases()
            .await
            .into_iter()
            .filter(|case| !seen.contains(&case.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::{fallback_case, permanent_cases};
    use clinic_types::MedicalImage;

    fn setup_test_repo() -> CaseRepository {
        CaseRepository::new(ClinicStore::in_memory())
    }

    fn generated_case(id: &str) -> PatientCase {
        PatientCase {
            id: id.to_string(),
            is_fallback: false,
            ..permanent_cases().remove(0)
        }
    }

    #[tokio::test]
    async fn test_save_ignores_duplicates() {
        let repo = setup_test_repo();
        repo.save_case(&generated_case("gen_1")).await;
        repo.save_case(&generated_case("gen_1")).await;
        assert_eq!(repo.get_all_cases().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_is_never_stored() {
        let repo = setup_test_repo();
        repo.save_case(&fallback_case()).await;
        assert!(repo.get_all_cases().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_strips_images() {
        let repo = setup_test_repo();
        let mut case = generated_case("gen_img");
        case.image_url = Some("data:image/png;base64,AAAA".to_string());
        case.medical_images = vec![
            MedicalImage {
                url: "data:image/png;base64,BBBB".to_string(),
                caption: "X-ray".to_string(),
            },
            MedicalImage {
                url: "https://example.org/scan.png".to_string(),
                caption: "Scan".to_string(),
            },
        ];

        repo.save_case(&case).await;

        let stored = &repo.get_all_cases().await[0];
        assert_eq!(stored.image_url, None);
        assert_eq!(stored.medical_images.len(), 1);
        assert_eq!(stored.medical_images[0].caption, "Scan");
    }

    #[tokio::test]
    async fn test_fifty_first_case_evicts_oldest() {
        let repo = setup_test_repo();
        for i in 0..=MAX_STORED_CASES {
            repo.save_case(&generated_case(&format!("gen_{}", i))).await;
        }

        let cases = repo.get_all_cases().await;
        assert_eq!(cases.len(), MAX_STORED_CASES);
        assert_eq!(cases[0].id, "gen_1");
        assert_eq!(cases[MAX_STORED_CASES - 1].id, "gen_50");
    }

    #[tokio::test]
    async fn test_mark_seen_is_idempotent() {
        let repo = setup_test_repo();
        repo.mark_seen("perm_001").await;
        let once = repo.get_seen_ids().await;
        repo.mark_seen("perm_001").await;

        assert_eq!(repo.get_seen_ids().await, once);
        assert!(repo.is_seen("perm_001").await);
        assert!(!repo.is_seen("perm_002").await);
    }

    #[tokio::test]
    async fn test_unseen_cases() {
        let repo = setup_test_repo();
        repo.save_case(&generated_case("gen_1")).await;
        repo.save_case(&generated_case("gen_2")).await;
        repo.mark_seen("gen_1").await;

        let unseen = repo.get_unseen_cases().await;
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].id, "gen_2");
    }
}
