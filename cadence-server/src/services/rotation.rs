//! Least-recently-used asset rotation per (brand, subcategory).
//!
//! Each key owns a bounded usage list ordered oldest-first. Selection and the
//! following usage record form a read-modify-write pair, so callers hold the
//! key's lock (see [`AssetRotator::bucket`]) across both.

use chrono::{NaiveDateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::services::channels::MediaType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RotationKey {
    pub brand_id: i32,
    pub subcategory_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub asset_id: i32,
    pub asset_type: MediaType,
    pub subcategory_id: i32,
    pub last_used_at: NaiveDateTime,
    pub usage_count: i32,
}

/// What a `record_usage` call changed, for write-through persistence.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub record: UsageRecord,
    pub evicted: Vec<i32>,
}

#[derive(Debug)]
pub struct UsageBucket {
    key: RotationKey,
    entries: Vec<UsageRecord>,
    cap: usize,
    hydrated: bool,
}

impl UsageBucket {
    pub fn new(key: RotationKey, cap: usize) -> Self {
        Self {
            key,
            entries: Vec::new(),
            cap: cap.max(1),
            hydrated: false,
        }
    }

    pub fn key(&self) -> RotationKey {
        self.key
    }

    /// Oldest first.
    pub fn entries(&self) -> &[UsageRecord] {
        &self.entries
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Load previously persisted history. Returns asset ids that no longer
    /// fit under the cap.
    pub fn hydrate(&mut self, mut records: Vec<UsageRecord>) -> Vec<i32> {
        records.sort_by_key(|r| r.last_used_at);
        self.entries = records;
        self.hydrated = true;
        self.truncate()
    }

    /// Drop in-memory history so the next use reloads it from storage. Used
    /// after a write that recorded usage was rolled back.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.hydrated = false;
    }

    pub fn record_usage(
        &mut self,
        asset_id: i32,
        asset_type: MediaType,
        now: NaiveDateTime,
    ) -> RecordOutcome {
        // Never move backwards in time, so list order always equals recency.
        let now = match self.entries.last() {
            Some(newest) if newest.last_used_at > now => newest.last_used_at,
            _ => now,
        };

        let record = match self.entries.iter().position(|e| e.asset_id == asset_id) {
            Some(idx) => {
                let mut existing = self.entries.remove(idx);
                existing.usage_count += 1;
                existing.last_used_at = now;
                existing.asset_type = asset_type;
                existing
            }
            None => UsageRecord {
                asset_id,
                asset_type,
                subcategory_id: self.key.subcategory_id,
                last_used_at: now,
                usage_count: 1,
            },
        };

        self.entries.push(record.clone());
        self.entries.sort_by_key(|r| r.last_used_at);
        let evicted = self.truncate();

        RecordOutcome { record, evicted }
    }

    /// Pick the asset to use next from `candidates`.
    ///
    /// Candidates without any recorded use come first, chosen uniformly at
    /// random so new uploads are not starved. Otherwise the candidate whose
    /// last use is oldest wins. `None` only for an empty candidate list.
    pub fn select_least_used<R: Rng + ?Sized>(&self, candidates: &[i32], rng: &mut R) -> Option<i32> {
        let unused: Vec<i32> = candidates
            .iter()
            .copied()
            .filter(|id| !self.entries.iter().any(|e| e.asset_id == *id))
            .collect();

        if let Some(id) = unused.choose(rng) {
            return Some(*id);
        }

        self.entries
            .iter()
            .find(|e| candidates.contains(&e.asset_id))
            .map(|e| e.asset_id)
    }

    fn truncate(&mut self) -> Vec<i32> {
        if self.entries.len() <= self.cap {
            return Vec::new();
        }
        let overflow = self.entries.len() - self.cap;
        self.entries.drain(..overflow).map(|e| e.asset_id).collect()
    }
}

/// Rotation state for every (brand, subcategory) touched by this process.
pub struct AssetRotator {
    buckets: Mutex<HashMap<RotationKey, Arc<Mutex<UsageBucket>>>>,
    max_history: usize,
}

impl AssetRotator {
    pub fn new(max_history: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    /// Lock the bucket for `key`. Hold the guard across select + record.
    pub async fn bucket(&self, key: RotationKey) -> OwnedMutexGuard<UsageBucket> {
        let bucket = {
            let mut buckets = self.buckets.lock().await;
            buckets
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(UsageBucket::new(key, self.max_history))))
                .clone()
        };
        bucket.lock_owned().await
    }

    /// Forget buckets that nobody holds or waits on. A forgotten key is
    /// rehydrated from storage on its next use, so this is only lossless for
    /// buckets whose usage is persisted write-through.
    pub async fn release_idle(&self) -> usize {
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        // Clones are only handed out under the map lock.
        buckets.retain(|_, bucket| Arc::strong_count(bucket) > 1);
        before - buckets.len()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }

    pub async fn select_least_used(&self, key: RotationKey, candidates: &[i32]) -> Option<i32> {
        let bucket = self.bucket(key).await;
        bucket.select_least_used(candidates, &mut rand::thread_rng())
    }

    pub async fn record_usage(
        &self,
        key: RotationKey,
        asset_id: i32,
        asset_type: MediaType,
    ) -> RecordOutcome {
        let mut bucket = self.bucket(key).await;
        bucket.record_usage(asset_id, asset_type, Utc::now().naive_utc())
    }
}
