//! Adaptive content introduction for conversational agents
//!
//! Decides when a user should be offered content from a category they showed
//! interest in, and learns from how they react:
//! - **Interest detection**: case-insensitive keyword matching over utterances
//! - **Engagement tracking**: decayed reinforcement of per-(user, category) scores
//! - **Admission control**: cooldown gate plus a score-driven stochastic draw
//! - **Item selection**: never repeats an item still in the recent window
//!
//! # Example
//!
//! ```rust,no_run
//! use content_admission::{
//!     Catalog, CatalogItem, Category, Config, InMemoryEngagementStore, IntroductionEngine,
//!     RngSource,
//! };
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! let engine = IntroductionEngine::from_config(
//!     Config::default(),
//!     Arc::new(InMemoryEngagementStore::new()),
//!     Arc::new(RngSource::from_entropy()),
//! );
//!
//! let catalog = Catalog::from_items(vec![CatalogItem::new(
//!     "vid-1",
//!     Category::new("sports"),
//!     "Last-ball finishes",
//! )]);
//!
//! let now = Utc::now();
//! if let Some(intro) = engine.suggest("u1", "I love watching cricket", &catalog, now)? {
//!     engine.record_shown("u1", &intro.item, now)?;
//!     engine.record_feedback("u1", &intro.item, Some(0.8), None, now)?;
//! }
//! # Ok::<(), content_admission::AdmissionError>(())
//! ```

pub mod admission;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod interest;
pub mod models;
pub mod random;
pub mod recorder;
pub mod store;
pub mod tracker;

// Re-export main types for convenience
pub use admission::{AdmissionController, AdmissionDecision};
pub use catalog::{Catalog, CatalogItem, ItemSelector};
pub use config::{AdmissionConfig, Config, TrackerConfig};
pub use engine::{Introduction, IntroductionEngine};
pub use error::{AdmissionError, ConfigError, Result};
pub use interest::{InterestDetector, InterestLexicon};
pub use models::{Category, EngagementKey, EngagementRecord, InteractionEvent, InteractionKind};
pub use random::{RandomSource, RngSource};
pub use recorder::{InteractionRecorder, RecordOutcome};
pub use store::{EngagementStore, InMemoryEngagementStore};
pub use tracker::{EngagementTracker, SentimentAdjustment, Transition};
