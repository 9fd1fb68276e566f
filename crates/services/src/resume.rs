use std::sync::Arc;

use videotrack_core::model::{ActivityId, UserId};
use storage::repository::AttemptRepository;

use crate::error::ResumeError;

/// Read-only provider of resume positions.
pub struct ResumeService {
    attempts: Arc<dyn AttemptRepository>,
}

impl ResumeService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Watched time of the most recent unfinished attempt for the pair.
    ///
    /// Returns `None` when the user has no unfinished attempts, including the
    /// case where they have no attempts at all. Completed attempts are never
    /// a resume source.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError::Storage` when repository access fails.
    pub async fn resume_point(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<f64>, ResumeError> {
        let latest = self.attempts.latest_unfinished(activity_id, user_id).await?;
        Ok(latest.map(|record| record.watched_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use videotrack_core::model::{Attempt, AttemptError};
    use videotrack_core::time::fixed_now;
    use storage::repository::{AttemptRecord, InMemoryRepository};

    async fn append(
        repo: &InMemoryRepository,
        watched: f64,
        completed: bool,
        offset_secs: i64,
    ) -> Result<(), AttemptError> {
        let attempt = Attempt::new(
            ActivityId::new(7),
            UserId::new(3),
            watched,
            completed,
            fixed_now() + Duration::seconds(offset_secs),
        )?;
        repo.append_attempt(AttemptRecord::from_attempt(&attempt))
            .await
            .unwrap();
        Ok(())
    }

    #[tokio::test]
    async fn returns_latest_unfinished_watched_time() {
        let repo = InMemoryRepository::new();
        append(&repo, 10.0, false, 0).await.unwrap();
        append(&repo, 42.5, false, 60).await.unwrap();

        let service = ResumeService::new(Arc::new(repo));
        let point = service
            .resume_point(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(point, Some(42.5));
    }

    #[tokio::test]
    async fn returns_none_before_any_attempt_exists() {
        let service = ResumeService::new(Arc::new(InMemoryRepository::new()));
        let point = service
            .resume_point(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(point, None);
    }

    #[tokio::test]
    async fn completed_attempts_are_not_resume_sources() {
        let repo = InMemoryRepository::new();
        append(&repo, 120.0, true, 0).await.unwrap();

        let service = ResumeService::new(Arc::new(repo));
        let point = service
            .resume_point(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(point, None);
    }
}
