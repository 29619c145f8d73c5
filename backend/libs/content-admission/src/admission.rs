// ============================================
// Admission Controller
// ============================================
//
// Decides whether content of a category may be introduced to a user now.
//
// Gates, in order (first failure short-circuits):
// 0. Optional user-wide gap: now - latest shown in any category < user_min_gap => deny
// 1. Cooldown: now - last_shown_at < min_gap  => deny
// 2. Probability from engagement score, anchored at
//      score -1 -> min_rate, 0 -> base_rate, +1 -> max_rate
//    (piecewise linear, then clamped to [min_rate, max_rate])
// 3. One uniform sample from the injected source: admit iff sample < probability
//    (drawn before entering the per-key scope; it does not depend on the record)
//
// Item-level dedup is left to the selection layer (see `catalog`), which must
// skip ids in the record's recent window.
//
// Per key:  Dormant -> Eligible -> (shown) Cooling -> (min_gap elapsed) Eligible

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::AdmissionConfig;
use crate::error::{AdmissionError, Result};
use crate::models::{Category, EngagementKey, EngagementRecord};
use crate::random::RandomSource;
use crate::store::EngagementStore;

/// Outcome of one admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdmissionDecision {
    /// Content of this category may be shown now.
    Admitted { probability: f64, sample: f64 },
    /// Eligible, but the stochastic draw declined.
    Declined { probability: f64, sample: f64 },
    /// A previous admission is still inside the minimum gap.
    CoolingDown { remaining: Duration },
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted { .. })
    }

    pub fn probability(&self) -> Option<f64> {
        match self {
            AdmissionDecision::Admitted { probability, .. }
            | AdmissionDecision::Declined { probability, .. } => Some(*probability),
            AdmissionDecision::CoolingDown { .. } => None,
        }
    }
}

/// Per (user, category) admission scheduler.
pub struct AdmissionController<S, R> {
    config: AdmissionConfig,
    store: S,
    random: R,
}

impl<S, R> AdmissionController<S, R>
where
    S: EngagementStore,
    R: RandomSource,
{
    pub fn new(config: AdmissionConfig, store: S, random: R) -> Self {
        Self {
            config,
            store,
            random,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn random(&self) -> &R {
        &self.random
    }

    /// Map an engagement score in [-1, 1] to an admission probability.
    pub fn probability(&self, engagement_score: f64) -> f64 {
        let AdmissionConfig {
            base_rate,
            min_rate,
            max_rate,
            ..
        } = self.config;

        let score = if engagement_score.is_finite() {
            engagement_score.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let raw = if score >= 0.0 {
            base_rate + score * (max_rate - base_rate)
        } else {
            base_rate + score * (base_rate - min_rate)
        };

        raw.clamp(min_rate, max_rate)
    }

    /// Evaluate the admission gates for (user, category) at `now`.
    ///
    /// A missing record is created with neutral defaults. The cooldown check runs
    /// inside the store's per-key scope.
    pub fn evaluate(
        &self,
        user_id: &str,
        category: &Category,
        now: DateTime<Utc>,
    ) -> Result<AdmissionDecision> {
        let key = validate_key(user_id, category)?;

        if let Some(remaining) = self.user_cooldown_remaining(&key.user_id, now)? {
            debug!(
                user_id = %key.user_id,
                category = %key.category,
                remaining_secs = remaining.num_seconds(),
                "User-wide gap not elapsed"
            );
            return Ok(AdmissionDecision::CoolingDown { remaining });
        }

        let sample = self.random.next_unit();
        let mut decision = None;
        let record = self.store.update(&key, &mut |record| {
            decision = Some(self.evaluate_record(record, now, sample));
        })?;

        let decision = decision.ok_or_else(|| {
            AdmissionError::store(format!("store did not apply update for {}", key))
        })?;

        debug!(
            user_id = %key.user_id,
            category = %key.category,
            engagement_score = record.engagement_score,
            decision = ?decision,
            "Admission evaluated"
        );

        Ok(decision)
    }

    /// `true` iff content of `category` may be introduced to `user_id` now.
    pub fn decide(&self, user_id: &str, category: &Category, now: DateTime<Utc>) -> Result<bool> {
        self.evaluate(user_id, category, now)
            .map(|decision| decision.is_admitted())
    }

    /// Current admission probability, ignoring cooldown. Does not create a record.
    pub fn probability_for(&self, user_id: &str, category: &Category) -> Result<f64> {
        let key = validate_key(user_id, category)?;
        let score = self
            .store
            .get(&key)?
            .map(|record| record.engagement_score)
            .unwrap_or(0.0);
        Ok(self.probability(score))
    }

    /// Dedup window for (user, category), oldest first. Empty for unseen pairs.
    pub fn recent_items(&self, user_id: &str, category: &Category) -> Result<Vec<String>> {
        Ok(self
            .snapshot(user_id, category)?
            .map(|record| record.recent_item_ids.into_iter().collect())
            .unwrap_or_default())
    }

    /// Copy of the stored record, if any.
    pub fn snapshot(&self, user_id: &str, category: &Category) -> Result<Option<EngagementRecord>> {
        let key = validate_key(user_id, category)?;
        self.store.get(&key)
    }

    fn user_cooldown_remaining(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Duration>> {
        let Some(gap) = self.config.user_min_gap else {
            return Ok(None);
        };
        let Some(last_shown) = self.store.user_last_shown(user_id)? else {
            return Ok(None);
        };

        let elapsed = now - last_shown;
        Ok((elapsed < gap).then(|| gap - elapsed))
    }

    fn evaluate_record(
        &self,
        record: &EngagementRecord,
        now: DateTime<Utc>,
        sample: f64,
    ) -> AdmissionDecision {
        if let Some(remaining) = record.cooldown_remaining(now, self.config.min_gap) {
            return AdmissionDecision::CoolingDown { remaining };
        }

        let probability = self.probability(record.engagement_score);

        if sample < probability {
            AdmissionDecision::Admitted {
                probability,
                sample,
            }
        } else {
            AdmissionDecision::Declined {
                probability,
                sample,
            }
        }
    }
}

pub(crate) fn validate_key(user_id: &str, category: &Category) -> Result<EngagementKey> {
    if user_id.trim().is_empty() {
        return Err(AdmissionError::invalid("user_id must not be empty"));
    }
    if category.is_empty() {
        return Err(AdmissionError::invalid("category must not be empty"));
    }
    Ok(EngagementKey::new(user_id, category.clone()))
}
