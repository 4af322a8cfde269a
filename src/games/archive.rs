//! Time-evicted archive of finished flips.
//!
//! Retention only governs how long a record can be re-displayed; the record
//! itself stays verifiable from its disclosed values forever.

use crate::games::types::FlipRecord;
use dashmap::DashMap;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct ArchivedFlip {
    record: Arc<FlipRecord>,
    archived_at: Instant,
}

/// Archive entry as seen by readers
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub record: Arc<FlipRecord>,
    /// Time left before eviction
    pub remaining: Duration,
}

pub struct FlipArchive {
    records: DashMap<String, ArchivedFlip>,
    retention: Duration,
}

impl FlipArchive {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Store a record under its match id, replacing any older entry
    pub fn insert(&self, record: Arc<FlipRecord>) {
        let match_id = record.match_id.clone();
        self.records.insert(
            match_id,
            ArchivedFlip {
                record,
                archived_at: Instant::now(),
            },
        );
    }

    /// Entries past retention read as absent even before the evictor runs.
    pub fn get(&self, match_id: &str) -> Option<ArchiveEntry> {
        let now = Instant::now();
        let entry = self.records.get(match_id)?;
        let remaining = self.remaining(&entry, now)?;

        Some(ArchiveEntry {
            record: entry.record.clone(),
            remaining,
        })
    }

    pub fn contains(&self, match_id: &str) -> bool {
        self.get(match_id).is_some()
    }

    /// Live entries, newest first
    pub fn recent(&self) -> Vec<ArchiveEntry> {
        let now = Instant::now();
        let mut entries: Vec<(Instant, ArchiveEntry)> = self
            .records
            .iter()
            .filter_map(|entry| {
                let remaining = self.remaining(&entry, now)?;
                Some((
                    entry.archived_at,
                    ArchiveEntry {
                        record: entry.record.clone(),
                        remaining,
                    },
                ))
            })
            .collect();

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, e)| e).collect()
    }

    /// Drop expired entries, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records
            .retain(|_, flip| now.saturating_duration_since(flip.archived_at) < self.retention);
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn remaining(&self, flip: &ArchivedFlip, now: Instant) -> Option<Duration> {
        let age = now.saturating_duration_since(flip.archived_at);
        self.retention.checked_sub(age).filter(|d| !d.is_zero())
    }

    /// Start the periodic eviction task
    pub fn spawn_evictor(self: &Arc<Self>, tick: Duration) -> ArchiveEvictor {
        let running = Arc::new(AtomicBool::new(true));
        let archive = self.clone();
        let flag = running.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            while flag.load(Ordering::SeqCst) {
                interval.tick().await;
                let evicted = archive.evict_expired();
                if evicted > 0 {
                    tracing::debug!("Evicted {} archived flips", evicted);
                }
            }
        });

        ArchiveEvictor { running }
    }
}

/// Handle to the background eviction task
pub struct ArchiveEvictor {
    running: Arc<AtomicBool>,
}

impl ArchiveEvictor {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{engine::FairOutcomeEngine, seed::SeedCommitment};

    fn record(match_id: &str) -> Arc<FlipRecord> {
        let engine = FairOutcomeEngine::new().unwrap();
        Arc::new(engine.compute_outcome(match_id, SeedCommitment::generate(0), None))
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_retention() {
        let archive = FlipArchive::new(Duration::from_secs(20));
        archive.insert(record("1001"));

        tokio::time::advance(Duration::from_secs(19)).await;
        let entry = archive.get("1001").expect("still retained");
        assert_eq!(entry.remaining, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(archive.get("1001").is_none());
        assert_eq!(archive.len(), 1);

        assert_eq!(archive.evict_expired(), 1);
        assert!(archive.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_is_newest_first() {
        let archive = FlipArchive::new(Duration::from_secs(20));
        archive.insert(record("1001"));
        tokio::time::advance(Duration::from_secs(2)).await;
        archive.insert(record("1002"));

        let ids: Vec<_> = archive
            .recent()
            .into_iter()
            .map(|e| e.record.match_id.clone())
            .collect();
        assert_eq!(ids, vec!["1002", "1001"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_evictor() {
        let archive = Arc::new(FlipArchive::new(Duration::from_secs(5)));
        archive.insert(record("2001"));
        let evictor = archive.spawn_evictor(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(archive.is_empty());
        evictor.stop();
    }

    #[tokio::test]
    async fn test_missing_record_reads_as_none() {
        let archive = FlipArchive::new(Duration::from_secs(20));
        assert!(archive.get("nope").is_none());
    }
}
