use std::sync::Arc;

use anyhow::bail;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::genai::CaseGenerator;
use clinic_core::{permanent_cases, validate_case};
use clinic_persistence::{CaseRepository, ClinicStore, StatsRepository};
use clinic_types::{CaseStats, PatientCase};

/// Odds used when picking where the next case comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Chance of generating a fresh case even when unseen ones remain.
    pub generate_probability: f64,
    /// Chance of preferring the permanent pool when both pools have cases.
    pub permanent_bias: f64,
}

impl SelectionPolicy {
    /// Pulls both odds into `[0, 1]`. NaN counts as never.
    pub fn clamped(self) -> Self {
        Self {
            generate_probability: probability(self.generate_probability),
            permanent_bias: probability(self.permanent_bias),
        }
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            generate_probability: 0.2,
            permanent_bias: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSource {
    Stored,
    Permanent,
    Generated,
}

#[derive(Debug, Clone)]
pub struct ServedCase {
    pub case: PatientCase,
    pub source: CaseSource,
}

pub struct CaseManager {
    cases: CaseRepository,
    stats: StatsRepository,
    generator: Arc<CaseGenerator>,
    permanent: Vec<PatientCase>,
    policy: SelectionPolicy,
    rng: Mutex<StdRng>,
}

impl CaseManager {
    pub fn new(store: ClinicStore, generator: Arc<CaseGenerator>) -> Self {
        Self {
            cases: CaseRepository::new(store.clone()),
            stats: StatsRepository::new(store),
            generator,
            permanent: permanent_cases(),
            policy: SelectionPolicy::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy.clamped();
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_permanent_cases(mut self, permanent: Vec<PatientCase>) -> Self {
        self.permanent = permanent;
        self
    }

    pub async fn get_next_case(&self, player_xp: u32) -> PatientCase {
        self.next_case(player_xp).await.case
    }

    /// Picks the next case and records it as seen.
    pub async fn next_case(&self, player_xp: u32) -> ServedCase {
        match self.select_case(player_xp).await {
            Ok(served) => served,
            Err(e) => {
                warn!("Case selection failed, serving a permanent case: {}", e);
                let pick = {
                    let mut rng = self.rng.lock().await;
                    self.permanent.choose(&mut *rng).cloned()
                };
                match pick {
                    Some(case) => ServedCase {
                        case,
                        source: CaseSource::Permanent,
                    },
                    None => self.generate(player_xp).await,
                }
            }
        }
    }

    async fn select_case(&self, player_xp: u32) -> anyhow::Result<ServedCase> {
        let unseen_dynamic = self.cases.get_unseen_cases().await;
        let seen = self.cases.get_seen_ids().await;
        let unseen_permanent: Vec<&PatientCase> = self
            .permanent
            .iter()
            .filter(|case| !seen.contains(&case.id))
            .collect();

        debug!(
            "Unseen cases: {} stored, {} permanent",
            unseen_dynamic.len(),
            unseen_permanent.len()
        );

        let nothing_unseen = unseen_dynamic.is_empty() && unseen_permanent.is_empty();
        let pick = {
            let mut rng = self.rng.lock().await;
            if nothing_unseen || rng.gen_bool(self.policy.generate_probability) {
                None
            } else {
                let prefer_permanent = !unseen_permanent.is_empty()
                    && (unseen_dynamic.is_empty() || rng.gen_bool(self.policy.permanent_bias));
                choose_from_pools(prefer_permanent, &unseen_permanent, &unseen_dynamic, &mut rng)
            }
        };

        let served = match pick {
            Some((mut case, source)) => {
                if let Err(e) = validate_case(&case) {
                    // Retire the broken entry so it is not picked again
                    self.cases.mark_seen(&case.id).await;
                    bail!("case {} is not playable: {}", case.id, e);
                }
                case.stats = self.stats.get_case_stats(&case.id).await;
                ServedCase { case, source }
            }
            None => self.generate(player_xp).await,
        };

        self.cases.mark_seen(&served.case.id).await;
        info!("Serving case {} ({:?})", served.case.id, served.source);
        Ok(served)
    }

    async fn generate(&self, player_xp: u32) -> ServedCase {
        let case = self.generator.generate_case(player_xp).await;
        if !case.is_fallback {
            self.cases.save_case(&case).await;
        }
        ServedCase {
            case,
            source: CaseSource::Generated,
        }
    }

    pub async fn submit_result(&self, case_id: &str, is_correct: bool) -> CaseStats {
        self.stats.update_case_stats(case_id, is_correct).await
    }
}

/// Uniform pick from the preferred pool. An empty pool falls through to the other one.
fn choose_from_pools(
    prefer_permanent: bool,
    permanent: &[&PatientCase],
    stored: &[PatientCase],
    rng: &mut StdRng,
) -> Option<(PatientCase, CaseSource)> {
    let from_permanent = |rng: &mut StdRng| {
        permanent
            .choose(rng)
            .map(|case| ((*case).clone(), CaseSource::Permanent))
    };
    let from_stored =
        |rng: &mut StdRng| stored.choose(rng).map(|case| (case.clone(), CaseSource::Stored));

    if prefer_permanent {
        from_permanent(rng).or_else(|| from_stored(rng))
    } else {
        from_stored(rng).or_else(|| from_permanent(rng))
    }
}
