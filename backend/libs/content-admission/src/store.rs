//! Engagement record storage with per-key serialization.
//!
//! Read-modify-write for one (user, category) key runs under that key's own lock;
//! unrelated keys never contend on a shared lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::{EngagementKey, EngagementRecord};

/// Persistence boundary for engagement records.
///
/// Implementations must make `update` atomic per key and let subsequent reads
/// observe the last committed write. Failures map to `AdmissionError::StoreUnavailable`.
pub trait EngagementStore: Send + Sync {
    /// Current record for `key`, if one exists.
    fn get(&self, key: &EngagementKey) -> Result<Option<EngagementRecord>>;

    /// Run `apply` on the record for `key` (created with neutral defaults when
    /// missing) inside the key's exclusive scope and return the committed value.
    fn update(
        &self,
        key: &EngagementKey,
        apply: &mut dyn FnMut(&mut EngagementRecord),
    ) -> Result<EngagementRecord>;

    /// Latest `last_shown_at` across all of `user_id`'s categories.
    ///
    /// Only consulted when a user-wide gap is configured. Stores without a
    /// per-user index report `None`, which disables that gate.
    fn user_last_shown(&self, _user_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

impl<T: EngagementStore + ?Sized> EngagementStore for Arc<T> {
    fn get(&self, key: &EngagementKey) -> Result<Option<EngagementRecord>> {
        (**self).get(key)
    }

    fn update(
        &self,
        key: &EngagementKey,
        apply: &mut dyn FnMut(&mut EngagementRecord),
    ) -> Result<EngagementRecord> {
        (**self).update(key, apply)
    }

    fn user_last_shown(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        (**self).user_last_shown(user_id)
    }
}

type RecordCell = Arc<Mutex<EngagementRecord>>;

/// Process-local store: one mutex-guarded cell per key inside a sharded map.
#[derive(Default)]
pub struct InMemoryEngagementStore {
    records: DashMap<EngagementKey, RecordCell>,
    last_shown_by_user: DashMap<String, DateTime<Utc>>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (user, category) records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn cell(&self, key: &EngagementKey) -> RecordCell {
        if let Some(cell) = self.records.get(key) {
            return cell.value().clone();
        }

        // Shard lock is released before the per-key lock is taken.
        self.records
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(key = %key, "Engagement record created");
                Arc::new(Mutex::new(EngagementRecord::default()))
            })
            .value()
            .clone()
    }
}

impl EngagementStore for InMemoryEngagementStore {
    fn get(&self, key: &EngagementKey) -> Result<Option<EngagementRecord>> {
        let cell = self.records.get(key).map(|cell| cell.value().clone());
        Ok(cell.map(|cell| cell.lock().clone()))
    }

    fn update(
        &self,
        key: &EngagementKey,
        apply: &mut dyn FnMut(&mut EngagementRecord),
    ) -> Result<EngagementRecord> {
        let cell = self.cell(key);
        let committed = {
            let mut record = cell.lock();
            apply(&mut record);
            record.clone()
        };

        if let Some(shown_at) = committed.last_shown_at {
            self.last_shown_by_user
                .entry(key.user_id.clone())
                .and_modify(|last| *last = (*last).max(shown_at))
                .or_insert(shown_at);
        }

        Ok(committed)
    }

    fn user_last_shown(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.last_shown_by_user.get(user_id).map(|entry| *entry.value()))
    }
}
