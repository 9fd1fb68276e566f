use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use videotrack_core::model::{Activity, ActivityId, Attempt, AttemptError, UserId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for an attempt, including its surrogate row id.
///
/// Mirrors the domain `Attempt` so repositories can serialize/deserialize
/// without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub id: Option<i64>,
    pub activity_id: ActivityId,
    pub user_id: UserId,
    pub watched_seconds: f64,
    pub completed: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    #[must_use]
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            id: None,
            activity_id: attempt.activity_id(),
            user_id: attempt.user_id(),
            watched_seconds: attempt.watched_seconds(),
            completed: attempt.completed(),
            recorded_at: attempt.recorded_at(),
        }
    }

    /// Convert the record back into a domain `Attempt`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the stored watched time fails validation.
    pub fn into_attempt(self) -> Result<Attempt, AttemptError> {
        Attempt::new(
            self.activity_id,
            self.user_id,
            self.watched_seconds,
            self.completed,
            self.recorded_at,
        )
    }
}

/// Repository contract for activities.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Persist or update an activity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the activity cannot be stored.
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError>;

    /// Fetch an activity by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_activity(&self, id: ActivityId) -> Result<Activity, StorageError>;
}

/// Append-only repository contract for attempt rows.
///
/// The contract has no update or delete: rows are immutable once written,
/// and resuming only ever reads the newest unfinished one.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Insert a new attempt row and return its surrogate id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn append_attempt(&self, record: AttemptRecord) -> Result<i64, StorageError>;

    /// The most recently recorded unfinished attempt for the pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure; an empty history is
    /// `Ok(None)`, not an error.
    async fn latest_unfinished(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<AttemptRecord>, StorageError>;

    /// Whether any completed attempt exists for the pair.
    ///
    /// Existence, not count: concurrent sessions can legitimately leave more
    /// than one completed row behind.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn has_completed(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<bool, StorageError>;

    /// Full chronological attempt history for the pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn attempts_for(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Vec<AttemptRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    activities: Arc<Mutex<HashMap<ActivityId, Activity>>>,
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            activities: Arc::new(Mutex::new(HashMap::new())),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError> {
        let mut guard = self
            .activities
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(activity.id(), activity.clone());
        Ok(())
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Activity, StorageError> {
        let guard = self
            .activities
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, record: AttemptRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))?;
        guard.push(AttemptRecord {
            id: Some(id),
            ..record
        });
        Ok(id)
    }

    async fn latest_unfinished(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<AttemptRecord>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|r| r.activity_id == activity_id && r.user_id == user_id && !r.completed)
            .max_by_key(|r| (r.recorded_at, r.id))
            .cloned())
    }

    async fn has_completed(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<bool, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .any(|r| r.activity_id == activity_id && r.user_id == user_id && r.completed))
    }

    async fn attempts_for(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRecord> = guard
            .iter()
            .filter(|r| r.activity_id == activity_id && r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.recorded_at, r.id));
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub activities: Arc<dyn ActivityRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let activities: Arc<dyn ActivityRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            activities,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use videotrack_core::model::ActivitySettings;
    use videotrack_core::time::fixed_now;

    fn build_activity(id: u64) -> Activity {
        Activity::new(
            ActivityId::new(id),
            format!("Activity {id}"),
            "https://cdn.example.org/lecture.mp4",
            ActivitySettings::default(),
            fixed_now(),
        )
        .unwrap()
    }

    fn build_record(watched: f64, completed: bool, offset_secs: i64) -> AttemptRecord {
        AttemptRecord {
            id: None,
            activity_id: ActivityId::new(7),
            user_id: UserId::new(3),
            watched_seconds: watched,
            completed,
            recorded_at: fixed_now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn activity_roundtrip_and_not_found() {
        let repo = InMemoryRepository::new();
        let activity = build_activity(7);
        repo.upsert_activity(&activity).await.unwrap();

        let fetched = repo.get_activity(activity.id()).await.unwrap();
        assert_eq!(fetched, activity);

        let err = repo.get_activity(ActivityId::new(999)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn latest_unfinished_picks_newest_incomplete_row() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(build_record(10.0, false, 0)).await.unwrap();
        repo.append_attempt(build_record(25.0, false, 60)).await.unwrap();
        repo.append_attempt(build_record(99.0, true, 120)).await.unwrap();

        let latest = repo
            .latest_unfinished(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.watched_seconds, 25.0);
    }

    #[tokio::test]
    async fn latest_unfinished_is_none_for_empty_history() {
        let repo = InMemoryRepository::new();
        let latest = repo
            .latest_unfinished(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn equal_timestamps_break_ties_by_insertion_order() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(build_record(10.0, false, 0)).await.unwrap();
        repo.append_attempt(build_record(20.0, false, 0)).await.unwrap();

        let latest = repo
            .latest_unfinished(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.watched_seconds, 20.0);
    }

    #[tokio::test]
    async fn has_completed_checks_existence_per_pair() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(build_record(10.0, false, 0)).await.unwrap();
        assert!(
            !repo
                .has_completed(ActivityId::new(7), UserId::new(3))
                .await
                .unwrap()
        );

        repo.append_attempt(build_record(60.0, true, 60)).await.unwrap();
        assert!(
            repo.has_completed(ActivityId::new(7), UserId::new(3))
                .await
                .unwrap()
        );
        // Other users are unaffected.
        assert!(
            !repo
                .has_completed(ActivityId::new(7), UserId::new(4))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn attempts_for_returns_chronological_history() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(build_record(30.0, false, 60)).await.unwrap();
        repo.append_attempt(build_record(10.0, false, 0)).await.unwrap();

        let rows = repo
            .attempts_for(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].watched_seconds, 10.0);
        assert_eq!(rows[1].watched_seconds, 30.0);
    }

    #[test]
    fn record_roundtrips_through_domain_attempt() {
        let record = build_record(42.5, false, 0);
        let attempt = record.clone().into_attempt().unwrap();
        assert_eq!(attempt.watched_seconds(), 42.5);
        let back = AttemptRecord::from_attempt(&attempt);
        assert_eq!(back.recorded_at, record.recorded_at);
        assert_eq!(back.id, None);
    }
}
