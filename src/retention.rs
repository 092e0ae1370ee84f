//! Retention sweep helpers.
//!
//! The store only provides the mechanism (`delete_older_than`); deciding
//! when to sweep belongs to the host application, typically a daily timer.
//! `RetentionPolicy` packages the cutoff arithmetic so hosts do not
//! hand-roll epoch math.

use chrono::{Duration, Utc};
use tracing::debug;

use crate::error::CacheError;
use crate::store::MessageStore;

/// Recommended retention window for chat history.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl RetentionPolicy {
    pub fn new(days: i64) -> Self {
        Self { days }
    }

    /// The cutoff in epoch milliseconds: now minus the retention window.
    /// Messages strictly older than this are sweep candidates.
    pub fn cutoff_ms(&self) -> i64 {
        (Utc::now() - Duration::days(self.days)).timestamp_millis()
    }

    /// Run one sweep against the store. Returns the number of rows removed.
    pub async fn sweep(&self, store: &MessageStore) -> Result<u64, CacheError> {
        let removed = store.delete_older_than(self.cutoff_ms()).await?;
        debug!(days = self.days, removed, "retention sweep complete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_in_the_past() {
        let policy = RetentionPolicy::default();
        assert!(policy.cutoff_ms() < Utc::now().timestamp_millis());
    }

    #[test]
    fn cutoff_tracks_the_window() {
        let now_ms = Utc::now().timestamp_millis();
        let one_day = RetentionPolicy::new(1).cutoff_ms();
        let thirty_days = RetentionPolicy::new(30).cutoff_ms();

        assert!(one_day > thirty_days);
        // Within a second of exactly one day back.
        assert!((now_ms - one_day - 86_400_000).abs() < 1_000);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::at_path(dir.path().join("cache.db"));
        let policy = RetentionPolicy::default();

        let old = crate::Message {
            id: "old".to_string(),
            content: "expired".to_string(),
            is_ai: false,
            timestamp: policy.cutoff_ms() - 1_000,
            session_id: "s1".to_string(),
        };
        let fresh = crate::Message {
            id: "fresh".to_string(),
            content: "kept".to_string(),
            is_ai: true,
            timestamp: Utc::now().timestamp_millis(),
            session_id: "s1".to_string(),
        };
        store.upsert(&old).await.unwrap();
        store.upsert(&fresh).await.unwrap();

        assert_eq!(policy.sweep(&store).await.unwrap(), 1);
        let remaining = store.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "fresh");
    }
}
