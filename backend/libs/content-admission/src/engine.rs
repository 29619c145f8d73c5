// ============================================
// Introduction Engine
// ============================================
//
// Wires the pieces into one conversational loop:
//
//   user text ──► InterestDetector ──► categories (sorted)
//                                          │
//                                          ▼
//                              AdmissionController::evaluate
//                                          │ admitted
//                                          ▼
//                     ItemSelector (skips recent_item_ids)
//                                          │
//                                          ▼
//                                   Introduction
//
// `suggest` never records anything. The caller reports the item through
// `record_shown` once it was actually displayed, and later `record_feedback`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::admission::{AdmissionController, AdmissionDecision};
use crate::catalog::{Catalog, CatalogItem, ItemSelector};
use crate::config::Config;
use crate::error::{AdmissionError, Result};
use crate::interest::InterestDetector;
use crate::models::{Category, InteractionEvent};
use crate::random::RandomSource;
use crate::recorder::{InteractionRecorder, RecordOutcome};
use crate::store::EngagementStore;
use crate::tracker::EngagementTracker;

/// An admitted category together with the item chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Introduction {
    pub category: Category,
    pub item: CatalogItem,
    /// Admission probability at the time of the decision.
    pub probability: f64,
}

/// Facade over detector, controller, selector and recorder sharing one store.
pub struct IntroductionEngine<S, R> {
    detector: InterestDetector,
    controller: AdmissionController<Arc<S>, Arc<R>>,
    recorder: InteractionRecorder<Arc<S>>,
}

impl<S, R> IntroductionEngine<S, R>
where
    S: EngagementStore,
    R: RandomSource,
{
    pub fn from_config(config: Config, store: Arc<S>, random: Arc<R>) -> Self {
        info!(
            categories = config.lexicon.len(),
            min_gap_secs = config.admission.min_gap.num_seconds(),
            recent_items_capacity = config.tracker.recent_items_capacity,
            "Introduction engine initialized"
        );

        Self {
            detector: InterestDetector::new(config.lexicon),
            controller: AdmissionController::new(config.admission, store.clone(), random),
            recorder: InteractionRecorder::new(EngagementTracker::new(config.tracker), store),
        }
    }

    pub fn detector(&self) -> &InterestDetector {
        &self.detector
    }

    pub fn controller(&self) -> &AdmissionController<Arc<S>, Arc<R>> {
        &self.controller
    }

    pub fn recorder(&self) -> &InteractionRecorder<Arc<S>> {
        &self.recorder
    }

    /// Find something to introduce for `text`, if any category is admitted.
    ///
    /// Categories are tried in name order. A category with no catalog items is
    /// skipped without drawing a sample. An admitted category whose items were all
    /// shown recently yields nothing and the next category is tried.
    pub fn suggest(
        &self,
        user_id: &str,
        text: &str,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Result<Option<Introduction>> {
        if user_id.trim().is_empty() {
            return Err(AdmissionError::invalid("user_id must not be empty"));
        }

        let categories = self.detector.detect(text);
        if categories.is_empty() {
            debug!(user_id = %user_id, "No interest detected");
            return Ok(None);
        }

        for category in categories {
            let candidates = catalog.items(&category);
            if candidates.is_empty() {
                debug!(user_id = %user_id, category = %category, "Catalog has no items");
                continue;
            }

            let probability = match self.controller.evaluate(user_id, &category, now)? {
                AdmissionDecision::Admitted { probability, .. } => probability,
                _ => continue,
            };

            let record = self.controller.snapshot(user_id, &category)?;
            let random = self.controller.random();
            if let Some(item) = ItemSelector::select(candidates, record.as_ref(), random) {
                debug!(
                    user_id = %user_id,
                    category = %category,
                    item_id = %item.id,
                    probability,
                    "Introduction suggested"
                );
                return Ok(Some(Introduction {
                    category,
                    item: item.clone(),
                    probability,
                }));
            }
        }

        Ok(None)
    }

    /// Report that `item` was displayed to `user_id` at `now`.
    pub fn record_shown(
        &self,
        user_id: &str,
        item: &CatalogItem,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let event = InteractionEvent::shown(user_id, item.id.clone(), item.category.clone(), now);
        self.recorder.record(&event)
    }

    /// Report the user's reaction to a previously shown item.
    pub fn record_feedback(
        &self,
        user_id: &str,
        item: &CatalogItem,
        sentiment: Option<f64>,
        feedback_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let mut event =
            InteractionEvent::feedback(user_id, item.id.clone(), item.category.clone(), 0.0, now);
        event.sentiment = sentiment;
        if let Some(text) = feedback_text {
            event = event.with_feedback_text(text);
        }
        self.recorder.record(&event)
    }

    pub fn record(&self, event: &InteractionEvent) -> Result<RecordOutcome> {
        self.recorder.record(event)
    }
}
