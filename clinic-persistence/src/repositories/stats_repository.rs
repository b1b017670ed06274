use std::collections::HashMap;

use crate::store::{ClinicStore, STATS_KEY};
use clinic_types::{CaseId, CaseStats};

type StatsTable = HashMap<CaseId, CaseStats>;

/// Global attempt counters per case.
#[derive(Clone)]
pub struct StatsRepository {
    store: ClinicStore,
}

impl StatsRepository {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    pub async fn get_all_stats(&self) -> StatsTable {
        self.store.get_stored_item(STATS_KEY, StatsTable::new()).await
    }

    pub async fn get_case_stats(&self, case_id: &str) -> Option<CaseStats> {
        self.get_all_stats().await.remove(case_id)
    }

    pub async fn update_case_stats(&self, case_id: &str, is_correct: bool) -> CaseStats {
        let mut table = self.get_all_stats().await;
        let stats = table
            .entry(case_id.to_string())
            .or_insert_with(|| CaseStats::new(case_id));
        stats.record(is_correct);
        let updated = stats.clone();

        self.store.set_stored_item(STATS_KEY, &table).await;
        updated
    }
}
