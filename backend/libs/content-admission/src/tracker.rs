// ============================================
// Engagement Tracker
// ============================================
//
// Pure state transition for one (user, category) record.
//
// Feedback rule:
//   next = clamp(prev * decay_factor + s * rate, -1, 1)
//
// Where:
//   - s: sentiment in [-1, 1] (clamped before use)
//   - rate: learning_rate for s >= 0, negative_learning_rate for s < 0
//
// Shown events move the cooldown timestamp forward and append the item to the
// dedup window; the score only changes if the shown event carries a sentiment.
// A non-finite sentiment never reaches the score or the feedback counter.

use crate::config::TrackerConfig;
use crate::models::{EngagementRecord, InteractionEvent, InteractionKind};

pub const SCORE_MIN: f64 = -1.0;
pub const SCORE_MAX: f64 = 1.0;

/// What happened to the event's sentiment before it was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentimentAdjustment {
    /// Used as given (or absent).
    None,
    /// Outside [-1, 1]; clamped into range.
    Clamped { original: f64 },
    /// Not a finite number; feedback carrying it does not touch the score.
    Discarded,
}

impl SentimentAdjustment {
    pub fn is_adjusted(&self) -> bool {
        !matches!(self, SentimentAdjustment::None)
    }
}

/// Result of [`EngagementTracker::next_state`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub record: EngagementRecord,
    /// Sentiment actually applied to the score, if any.
    pub applied_sentiment: Option<f64>,
    pub sentiment: SentimentAdjustment,
}

#[derive(Debug, Clone, Default)]
pub struct EngagementTracker {
    config: TrackerConfig,
}

impl EngagementTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Clamp a raw sentiment into [-1, 1], discarding non-finite values.
    pub fn sanitize_sentiment(raw: Option<f64>) -> (Option<f64>, SentimentAdjustment) {
        match raw {
            None => (None, SentimentAdjustment::None),
            Some(s) if !s.is_finite() => (None, SentimentAdjustment::Discarded),
            Some(s) if !(SCORE_MIN..=SCORE_MAX).contains(&s) => (
                Some(s.clamp(SCORE_MIN, SCORE_MAX)),
                SentimentAdjustment::Clamped { original: s },
            ),
            Some(s) => (Some(s), SentimentAdjustment::None),
        }
    }

    /// Apply one feedback sentiment to a score.
    pub fn reinforce(&self, score: f64, sentiment: f64) -> f64 {
        let rate = if sentiment < 0.0 {
            self.config.negative_learning_rate
        } else {
            self.config.learning_rate
        };
        (score * self.config.decay_factor + sentiment * rate).clamp(SCORE_MIN, SCORE_MAX)
    }

    /// Compute the next record for `event`. Does not touch any store.
    pub fn next_state(&self, prev: &EngagementRecord, event: &InteractionEvent) -> Transition {
        let mut next = prev.clone();
        let (sentiment, adjustment) = Self::sanitize_sentiment(event.sentiment);

        let applied_sentiment = match event.kind {
            InteractionKind::Shown => {
                next.last_shown_at = Some(match prev.last_shown_at {
                    Some(last) if last > event.occurred_at => last,
                    _ => event.occurred_at,
                });
                next.push_recent_item(&event.item_id, self.config.recent_items_capacity);
                next.shown_count += 1;
                sentiment
            }
            // A non-finite sentiment makes the feedback a no-op.
            InteractionKind::Feedback if adjustment == SentimentAdjustment::Discarded => None,
            // Feedback without a score is neutral: decay only.
            InteractionKind::Feedback => {
                next.feedback_count += 1;
                Some(sentiment.unwrap_or(0.0))
            }
        };

        if let Some(s) = applied_sentiment {
            next.engagement_score = self.reinforce(prev.engagement_score, s);
        }

        next.updated_at = Some(match prev.updated_at {
            Some(last) if last > event.occurred_at => last,
            _ => event.occurred_at,
        });

        Transition {
            record: next,
            applied_sentiment,
            sentiment: adjustment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{Duration, Utc};

    fn sports() -> Category {
        Category::new("sports")
    }

    fn feedback(sentiment: f64) -> InteractionEvent {
        InteractionEvent::feedback("u1", "vid-1", sports(), sentiment, Utc::now())
    }

    #[test]
    fn test_positive_feedback_raises_score() {
        let tracker = EngagementTracker::default();
        let t = tracker.next_state(&EngagementRecord::new(), &feedback(0.8));

        // 0 * 0.9 + 0.8 * 0.3
        assert!((t.record.engagement_score - 0.24).abs() < 1e-9);
        assert_eq!(t.record.feedback_count, 1);
        assert_eq!(t.applied_sentiment, Some(0.8));
    }

    #[test]
    fn test_negative_feedback_uses_negative_rate() {
        let tracker = EngagementTracker::default();
        let mut record = EngagementRecord::new();
        record.engagement_score = 0.5;

        let t = tracker.next_state(&record, &feedback(-0.6));

        // 0.5 * 0.9 - 0.6 * 0.8
        assert!((t.record.engagement_score - (-0.03)).abs() < 1e-9);
    }

    #[test]
    fn test_feedback_without_sentiment_only_decays() {
        let tracker = EngagementTracker::default();
        let mut record = EngagementRecord::new();
        record.engagement_score = 0.5;

        let mut event = feedback(0.0);
        event.sentiment = None;
        let t = tracker.next_state(&record, &event);

        assert!((t.record.engagement_score - 0.45).abs() < 1e-9);
        assert_eq!(t.sentiment, SentimentAdjustment::None);
    }

    #[test]
    fn test_score_is_clamped() {
        let tracker = EngagementTracker::new(TrackerConfig {
            decay_factor: 1.0,
            learning_rate: 1.0,
            negative_learning_rate: 1.0,
            ..Default::default()
        });
        let mut record = EngagementRecord::new();
        record.engagement_score = 0.9;

        let t = tracker.next_state(&record, &feedback(1.0));
        assert_eq!(t.record.engagement_score, SCORE_MAX);

        record.engagement_score = -0.9;
        let t = tracker.next_state(&record, &feedback(-1.0));
        assert_eq!(t.record.engagement_score, SCORE_MIN);
    }

    #[test]
    fn test_out_of_range_sentiment_is_clamped() {
        let tracker = EngagementTracker::default();
        let t = tracker.next_state(&EngagementRecord::new(), &feedback(3.5));

        assert_eq!(t.sentiment, SentimentAdjustment::Clamped { original: 3.5 });
        assert_eq!(t.applied_sentiment, Some(1.0));
        assert!((t.record.engagement_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_feedback_leaves_score_untouched() {
        let tracker = EngagementTracker::default();
        let mut record = EngagementRecord::new();
        record.engagement_score = 0.5;
        record.feedback_count = 3;

        for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let t = tracker.next_state(&record, &feedback(raw));

            assert_eq!(t.sentiment, SentimentAdjustment::Discarded);
            assert_eq!(t.applied_sentiment, None);
            assert_eq!(t.record.engagement_score, 0.5);
            assert_eq!(t.record.feedback_count, 3);
        }
    }

    #[test]
    fn test_non_finite_sentiment_on_shown_keeps_bookkeeping() {
        let tracker = EngagementTracker::default();
        let now = Utc::now();
        let mut record = EngagementRecord::new();
        record.engagement_score = 0.5;

        let event = InteractionEvent::shown("u1", "vid-1", sports(), now).with_sentiment(f64::NAN);
        let t = tracker.next_state(&record, &event);

        assert_eq!(t.record.engagement_score, 0.5);
        assert_eq!(t.record.last_shown_at, Some(now));
        assert_eq!(t.record.shown_count, 1);
    }

    #[test]
    fn test_shown_updates_cooldown_and_window() {
        let tracker = EngagementTracker::default();
        let now = Utc::now();
        let event = InteractionEvent::shown("u1", "vid-1", sports(), now);

        let t = tracker.next_state(&EngagementRecord::new(), &event);

        assert_eq!(t.record.last_shown_at, Some(now));
        assert!(t.record.was_recently_shown("vid-1"));
        assert_eq!(t.record.engagement_score, 0.0);
        assert_eq!(t.record.shown_count, 1);
        assert_eq!(t.applied_sentiment, None);
    }

    #[test]
    fn test_shown_with_sentiment_applies_feedback_rule() {
        let tracker = EngagementTracker::default();
        let event =
            InteractionEvent::shown("u1", "vid-1", sports(), Utc::now()).with_sentiment(0.8);

        let t = tracker.next_state(&EngagementRecord::new(), &event);
        assert!((t.record.engagement_score - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_last_shown_never_moves_backwards() {
        let tracker = EngagementTracker::default();
        let now = Utc::now();
        let mut record = EngagementRecord::new();
        record.last_shown_at = Some(now);

        let late = InteractionEvent::shown("u1", "vid-2", sports(), now - Duration::hours(1));
        let t = tracker.next_state(&record, &late);

        assert_eq!(t.record.last_shown_at, Some(now));
        assert!(t.record.was_recently_shown("vid-2"));
    }

    #[test]
    fn test_window_capacity_respected() {
        let tracker = EngagementTracker::new(TrackerConfig {
            recent_items_capacity: 2,
            ..Default::default()
        });
        let now = Utc::now();
        let mut record = EngagementRecord::new();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let event = InteractionEvent::shown("u1", *id, sports(), now + Duration::seconds(i as i64));
            record = tracker.next_state(&record, &event).record;
        }

        let ids: Vec<_> = record.recent_item_ids.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
