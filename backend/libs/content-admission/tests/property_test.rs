use chrono::{Duration, TimeZone, Utc};
use content_admission::{
    AdmissionConfig, AdmissionController, Category, EngagementRecord, EngagementTracker,
    InMemoryEngagementStore, InteractionEvent, InteractionRecorder, InterestDetector,
    InterestLexicon, RngSource,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;

fn sports() -> Category {
    Category::new("sports")
}

type Controller = AdmissionController<Arc<InMemoryEngagementStore>, RngSource<StdRng>>;

fn controller(config: AdmissionConfig) -> Controller {
    AdmissionController::new(
        config,
        Arc::new(InMemoryEngagementStore::new()),
        RngSource::seeded(5),
    )
}

/// Score after `k` identical feedbacks starting from neutral.
fn scores_after(sentiment: f64, k: usize) -> Vec<f64> {
    let tracker = EngagementTracker::default();
    let now = Utc::now();
    let mut record = EngagementRecord::new();
    let mut scores = vec![record.engagement_score];
    for i in 0..k {
        let event = InteractionEvent::feedback("u1", format!("vid-{}", i), sports(), sentiment, now);
        record = tracker.next_state(&record, &event).record;
        scores.push(record.engagement_score);
    }
    scores
}

proptest! {
    #[test]
    fn negative_feedback_never_raises_score(s in -1.0f64..0.0, k in 1usize..40) {
        let scores = scores_after(s, k);
        for pair in scores.windows(2) {
            prop_assert!(pair[1] <= pair[0] + 1e-12, "{} -> {}", pair[0], pair[1]);
            prop_assert!(pair[1] >= -1.0);
        }
    }

    #[test]
    fn strong_negative_feedback_reaches_min_rate(s in -1.0f64..=-0.2) {
        let c = controller(AdmissionConfig::default());
        let score = *scores_after(s, 40).last().unwrap();
        prop_assert!((c.probability(score) - 0.02).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn strong_positive_feedback_reaches_max_rate(s in 0.4f64..=1.0) {
        let c = controller(AdmissionConfig::default());
        let score = *scores_after(s, 40).last().unwrap();
        prop_assert!((c.probability(score) - 0.9).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn probability_is_monotone_and_bounded(a in -1.0f64..=1.0, b in -1.0f64..=1.0) {
        let c = controller(AdmissionConfig::default());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (p_lo, p_hi) = (c.probability(lo), c.probability(hi));
        prop_assert!(p_lo <= p_hi + 1e-12);
        prop_assert!((0.02..=0.9).contains(&p_lo));
        prop_assert!((0.02..=0.9).contains(&p_hi));
    }

    #[test]
    fn detect_is_case_insensitive_and_idempotent(
        prefix in "[a-zA-Z ]{0,30}",
        keyword in prop::sample::select(vec!["cricket", "Startup", "PODCAST", "world cup", ""]),
        suffix in "[a-zA-Z ]{0,30}",
    ) {
        let detector = InterestDetector::new(InterestLexicon::default());
        let text = format!("{}{}{}", prefix, keyword, suffix);

        let detected = detector.detect(&text);
        prop_assert_eq!(&detected, &detector.detect(&text));
        prop_assert_eq!(&detected, &detector.detect(&text.to_uppercase()));
        prop_assert_eq!(&detected, &detector.detect(&text.to_lowercase()));
    }

    #[test]
    fn window_holds_last_ids_oldest_first(n in 1usize..40) {
        let store = Arc::new(InMemoryEngagementStore::new());
        let recorder = InteractionRecorder::new(EngagementTracker::default(), store.clone());
        let c = AdmissionController::new(AdmissionConfig::default(), store, RngSource::seeded(1));
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for i in 0..n {
            let event = InteractionEvent::shown(
                "u1",
                format!("vid-{}", i),
                sports(),
                start + Duration::seconds(i as i64),
            );
            recorder.record(&event).unwrap();
        }

        let expected: Vec<String> = (n.saturating_sub(10)..n).map(|i| format!("vid-{}", i)).collect();
        prop_assert_eq!(c.recent_items("u1", &sports()).unwrap(), expected);
    }

    #[test]
    fn cooldown_holds_until_min_gap(elapsed_secs in 0i64..1200) {
        let store = Arc::new(InMemoryEngagementStore::new());
        let recorder = InteractionRecorder::new(EngagementTracker::default(), store.clone());
        // Probability pinned at 1.0 so only the cooldown gate decides.
        let c = AdmissionController::new(
            AdmissionConfig { base_rate: 1.0, min_rate: 1.0, max_rate: 1.0, ..Default::default() },
            store,
            RngSource::seeded(1),
        );
        let shown_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        recorder.record(&InteractionEvent::shown("u1", "vid-1", sports(), shown_at)).unwrap();

        let admitted = c.decide("u1", &sports(), shown_at + Duration::seconds(elapsed_secs)).unwrap();
        prop_assert_eq!(admitted, elapsed_secs >= 600);
    }
}
