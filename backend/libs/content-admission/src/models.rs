use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Topical tag used to partition interest and engagement state (e.g. "sports").
///
/// Names are trimmed and lowercased on construction so "Sports " and "sports"
/// address the same engagement record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::new(name)
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::new(name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

/// Key of one engagement record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngagementKey {
    pub user_id: String,
    pub category: Category,
}

impl EngagementKey {
    pub fn new(user_id: impl Into<String>, category: Category) -> Self {
        Self {
            user_id: user_id.into(),
            category,
        }
    }
}

impl std::fmt::Display for EngagementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user_id, self.category)
    }
}

/// Per (user, category) engagement state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementRecord {
    /// Decayed, feedback-reinforced score in [-1.0, 1.0]. 0.0 is neutral.
    pub engagement_score: f64,
    /// Most recent `shown` event for this key.
    pub last_shown_at: Option<DateTime<Utc>>,
    /// Dedup window, oldest first.
    pub recent_item_ids: VecDeque<String>,
    pub shown_count: u64,
    pub feedback_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for EngagementRecord {
    fn default() -> Self {
        Self {
            engagement_score: 0.0,
            last_shown_at: None,
            recent_item_ids: VecDeque::new(),
            shown_count: 0,
            feedback_count: 0,
            updated_at: None,
        }
    }
}

impl EngagementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining cooldown at `now`, or `None` when the key is eligible.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, min_gap: Duration) -> Option<Duration> {
        let last_shown = self.last_shown_at?;
        let elapsed = now - last_shown;
        if elapsed < min_gap {
            Some(min_gap - elapsed)
        } else {
            None
        }
    }

    pub fn was_recently_shown(&self, item_id: &str) -> bool {
        self.recent_item_ids.iter().any(|id| id == item_id)
    }

    /// Appends to the dedup window, moving an existing id to the newest slot and
    /// evicting from the front past `capacity`.
    pub fn push_recent_item(&mut self, item_id: &str, capacity: usize) {
        self.recent_item_ids.retain(|id| id != item_id);
        self.recent_item_ids.push_back(item_id.to_string());
        while self.recent_item_ids.len() > capacity {
            self.recent_item_ids.pop_front();
        }
    }
}

/// Kind of interaction reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// The item was displayed to the user.
    Shown,
    /// The user's reaction to an item was assessed.
    Feedback,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Shown => "shown",
            InteractionKind::Feedback => "feedback",
        }
    }
}

/// Immutable interaction fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: String,
    pub item_id: String,
    /// Category of the item; selects the engagement record to update.
    pub category: Category,
    pub kind: InteractionKind,
    pub feedback_text: Option<String>,
    /// Sentiment in [-1.0, 1.0]. Absent means neutral.
    pub sentiment: Option<f64>,
    pub occurred_at: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn shown(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        category: Category,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            category,
            kind: InteractionKind::Shown,
            feedback_text: None,
            sentiment: None,
            occurred_at,
        }
    }

    pub fn feedback(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        category: Category,
        sentiment: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            category,
            kind: InteractionKind::Feedback,
            feedback_text: None,
            sentiment: Some(sentiment),
            occurred_at,
        }
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_feedback_text(mut self, text: impl Into<String>) -> Self {
        self.feedback_text = Some(text.into());
        self
    }

    pub fn key(&self) -> EngagementKey {
        EngagementKey::new(self.user_id.clone(), self.category.clone())
    }
}
