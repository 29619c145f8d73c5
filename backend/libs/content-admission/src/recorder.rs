//! Interaction write path.
//!
//! Validates an event, runs the engagement tracker against the current record
//! inside the store's per-key scope, and commits the result. Replays are not
//! detected: delivery is at-least-once and a duplicate only causes minor drift.

use tracing::{debug, warn};

use crate::error::{AdmissionError, Result};
use crate::models::{EngagementRecord, InteractionEvent};
use crate::store::EngagementStore;
use crate::tracker::{EngagementTracker, SentimentAdjustment};

/// What a successful `record` call committed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record: EngagementRecord,
    pub sentiment: SentimentAdjustment,
}

impl RecordOutcome {
    /// Validation problem that was recovered from, if any.
    pub fn recovered_error(&self) -> Option<AdmissionError> {
        match self.sentiment {
            SentimentAdjustment::Clamped { original } => {
                Some(AdmissionError::OutOfRange { value: original })
            }
            SentimentAdjustment::Discarded => {
                Some(AdmissionError::invalid("sentiment is not finite"))
            }
            SentimentAdjustment::None => None,
        }
    }
}

pub struct InteractionRecorder<S> {
    tracker: EngagementTracker,
    store: S,
}

impl<S: EngagementStore> InteractionRecorder<S> {
    pub fn new(tracker: EngagementTracker, store: S) -> Self {
        Self { tracker, store }
    }

    pub fn tracker(&self) -> &EngagementTracker {
        &self.tracker
    }

    /// Apply `event` to its (user, category) record.
    ///
    /// Empty identifiers fail with `InvalidArgument` and leave state untouched.
    /// Out-of-range sentiment is clamped and reported in the outcome; a non-finite
    /// sentiment leaves the score untouched and is reported as `InvalidArgument`.
    pub fn record(&self, event: &InteractionEvent) -> Result<RecordOutcome> {
        validate_event(event)?;

        let key = event.key();
        let mut adjustment = SentimentAdjustment::None;
        let record = self.store.update(&key, &mut |record| {
            let transition = self.tracker.next_state(record, event);
            adjustment = transition.sentiment;
            *record = transition.record;
        })?;

        if adjustment.is_adjusted() {
            warn!(
                user_id = %event.user_id,
                item_id = %event.item_id,
                category = %event.category,
                raw_sentiment = ?event.sentiment,
                adjustment = ?adjustment,
                "Invalid sentiment recovered"
            );
        }

        debug!(
            user_id = %event.user_id,
            item_id = %event.item_id,
            category = %event.category,
            kind = event.kind.as_str(),
            engagement_score = record.engagement_score,
            recent_items = record.recent_item_ids.len(),
            has_feedback_text = event.feedback_text.is_some(),
            "Interaction recorded"
        );

        Ok(RecordOutcome {
            record,
            sentiment: adjustment,
        })
    }
}

fn validate_event(event: &InteractionEvent) -> Result<()> {
    if event.user_id.trim().is_empty() {
        return Err(AdmissionError::invalid("event user_id must not be empty"));
    }
    if event.item_id.trim().is_empty() {
        return Err(AdmissionError::invalid("event item_id must not be empty"));
    }
    if event.category.is_empty() {
        return Err(AdmissionError::invalid("event category must not be empty"));
    }
    Ok(())
}
