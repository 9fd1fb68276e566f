use std::sync::Arc;

use chrono::{DateTime, Utc};

use videotrack_core::model::{ActivityId, Attempt, AttemptDraft, UserId};
use videotrack_core::time::Clock;
use storage::repository::{ActivityRepository, AttemptRecord, AttemptRepository};

use crate::completion::CompletionService;
use crate::error::AttemptServiceError;

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new attempt row was inserted.
    Recorded { attempt_id: i64 },
    /// A completed attempt already exists for the pair; nothing was inserted.
    Skipped,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Write path for attempts.
///
/// Validates a client draft, enforces the one-completed-attempt-per-pair
/// rule, and inserts a new row stamped with the service clock. Each call is
/// an independent stateless request; the precondition check and the insert
/// are not serialized across concurrent sessions, which can leave duplicate
/// completed rows behind. The evaluator only checks existence, so the race
/// is benign.
pub struct AttemptService {
    clock: Clock,
    activities: Arc<dyn ActivityRepository>,
    attempts: Arc<dyn AttemptRepository>,
    completion: Arc<CompletionService>,
}

impl AttemptService {
    #[must_use]
    pub fn new(
        clock: Clock,
        activities: Arc<dyn ActivityRepository>,
        attempts: Arc<dyn AttemptRepository>,
        completion: Arc<CompletionService>,
    ) -> Self {
        Self {
            clock,
            activities,
            attempts,
            completion,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Record a watch-session submission.
    ///
    /// - Validates the draft before touching the attempt store.
    /// - Resolves the activity; an unknown id aborts the request.
    /// - Returns `Skipped` without inserting when a completed attempt already
    ///   exists for the pair. Repeated unfinished submissions are not
    ///   deduplicated: each partial session adds a row.
    /// - On a completed submission, re-derives completion state and reports
    ///   it to the engine before returning, so the side effect is observable
    ///   by the time the write resolves.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Attempt` for an invalid watched time,
    /// `StorageError::NotFound` (wrapped) for an unknown activity, and other
    /// storage errors when persistence fails.
    pub async fn submit_attempt(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
        draft: AttemptDraft,
    ) -> Result<SubmitOutcome, AttemptServiceError> {
        let attempt = Attempt::new(
            activity_id,
            user_id,
            draft.watched_seconds,
            draft.completed,
            self.clock.now(),
        )?;

        self.activities.get_activity(activity_id).await?;

        if self.attempts.has_completed(activity_id, user_id).await? {
            return Ok(SubmitOutcome::Skipped);
        }

        let attempt_id = self
            .attempts
            .append_attempt(AttemptRecord::from_attempt(&attempt))
            .await?;

        if attempt.completed() {
            self.completion
                .on_attempt_completed(activity_id, user_id)
                .await?;
        }

        Ok(SubmitOutcome::Recorded { attempt_id })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
