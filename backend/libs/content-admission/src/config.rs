use chrono::Duration;
use serde::Deserialize;
use std::env;
use tracing::info;

use crate::error::ConfigError;
use crate::interest::InterestLexicon;

const ENV_PREFIX: &str = "CONTENT_ADMISSION_";
const LEXICON_PATH_VAR: &str = "CONTENT_ADMISSION_LEXICON_PATH";

/// Admission scheduling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    /// Admission probability for a neutral (0.0) engagement score.
    pub base_rate: f64,
    /// Floor of the admission probability.
    pub min_rate: f64,
    /// Ceiling of the admission probability.
    pub max_rate: f64,
    /// Minimum time between two admissions for the same (user, category).
    pub min_gap: Duration,
    /// Optional minimum time between any two admissions for the same user,
    /// across categories. Off by default.
    pub user_min_gap: Option<Duration>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.3,
            min_rate: 0.02,
            max_rate: 0.9,
            min_gap: Duration::minutes(10),
            user_min_gap: None,
        }
    }
}

/// Engagement score update parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Multiplier applied to the previous score on every feedback.
    pub decay_factor: f64,
    /// Weight of non-negative sentiment.
    pub learning_rate: f64,
    /// Weight of negative sentiment.
    pub negative_learning_rate: f64,
    /// Size of the recently-shown dedup window.
    pub recent_items_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.9,
            learning_rate: 0.3,
            negative_learning_rate: 0.8,
            recent_items_capacity: 10,
        }
    }
}

/// Full configuration surface, fixed at process start.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub admission: AdmissionConfig,
    pub tracker: TrackerConfig,
    pub lexicon: InterestLexicon,
}

/// Optional overrides read from `CONTENT_ADMISSION_*` variables.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    base_rate: Option<f64>,
    min_rate: Option<f64>,
    max_rate: Option<f64>,
    min_gap_secs: Option<i64>,
    user_min_gap_secs: Option<i64>,
    recent_items_capacity: Option<usize>,
    decay_factor: Option<f64>,
    learning_rate: Option<f64>,
    negative_learning_rate: Option<f64>,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Every variable is optional; unset values keep their defaults. The lexicon is
    /// read from `CONTENT_ADMISSION_LEXICON_PATH` when set, else the built-in one is used.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_env()?;
        let mut config = Config::default();
        config.apply(overrides)?;

        if let Ok(path) = env::var(LEXICON_PATH_VAR) {
            config.lexicon = InterestLexicon::from_json_file(&path)?;
        }

        config.validate()?;

        info!(
            base_rate = config.admission.base_rate,
            min_rate = config.admission.min_rate,
            max_rate = config.admission.max_rate,
            min_gap_secs = config.admission.min_gap.num_seconds(),
            categories = config.lexicon.len(),
            "Content admission config loaded"
        );

        Ok(config)
    }

    fn apply(&mut self, overrides: EnvOverrides) -> Result<(), ConfigError> {
        let admission = &mut self.admission;
        if let Some(v) = overrides.base_rate {
            admission.base_rate = v;
        }
        if let Some(v) = overrides.min_rate {
            admission.min_rate = v;
        }
        if let Some(v) = overrides.max_rate {
            admission.max_rate = v;
        }
        if let Some(v) = overrides.min_gap_secs {
            admission.min_gap = gap_from_secs("min_gap_secs", v)?;
        }
        if let Some(v) = overrides.user_min_gap_secs {
            admission.user_min_gap = Some(gap_from_secs("user_min_gap_secs", v)?);
        }

        let tracker = &mut self.tracker;
        if let Some(v) = overrides.recent_items_capacity {
            tracker.recent_items_capacity = v;
        }
        if let Some(v) = overrides.decay_factor {
            tracker.decay_factor = v;
        }
        if let Some(v) = overrides.learning_rate {
            tracker.learning_rate = v;
        }
        if let Some(v) = overrides.negative_learning_rate {
            tracker.negative_learning_rate = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.admission.validate()?;
        self.tracker.validate()?;
        if self.lexicon.is_empty() {
            return Err(ConfigError::Invalid("lexicon has no categories".to_string()));
        }
        Ok(())
    }
}

fn gap_from_secs(name: &str, secs: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(secs)
        .ok_or_else(|| ConfigError::Invalid(format!("{} out of range: {}", name, secs)))
}

impl AdmissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [self.min_rate, self.base_rate, self.max_rate];
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::Invalid("admission rates must be finite".to_string()));
        }
        if !(0.0 <= self.min_rate
            && self.min_rate <= self.base_rate
            && self.base_rate <= self.max_rate
            && self.max_rate <= 1.0)
        {
            return Err(ConfigError::Invalid(format!(
                "expected 0 <= min_rate ({}) <= base_rate ({}) <= max_rate ({}) <= 1",
                self.min_rate, self.base_rate, self.max_rate
            )));
        }
        if self.min_gap < Duration::zero() {
            return Err(ConfigError::Invalid("min_gap must not be negative".to_string()));
        }
        if self.user_min_gap.is_some_and(|gap| gap < Duration::zero()) {
            return Err(ConfigError::Invalid("user_min_gap must not be negative".to_string()));
        }
        Ok(())
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "decay_factor must be in (0, 1], got {}",
                self.decay_factor
            )));
        }
        for (name, rate) in [
            ("learning_rate", self.learning_rate),
            ("negative_learning_rate", self.negative_learning_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.recent_items_capacity == 0 {
            return Err(ConfigError::Invalid(
                "recent_items_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
