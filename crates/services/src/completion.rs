use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use videotrack_core::model::{ActivityId, CompletionState, UserId};
use storage::repository::AttemptRepository;

use crate::error::CompletionError;

/// Rule name under which this evaluator answers the completion engine.
pub const WATCH_COMPLETE_RULE: &str = "watchcomplete";

//
// ─── SINK ──────────────────────────────────────────────────────────────────────
//

/// State-update capability of the external completion engine.
///
/// Calls flow one way, evaluator to engine; the evaluator never reads the
/// engine's own state back.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn state_updated(&self, activity_id: ActivityId, user_id: UserId, state: CompletionState);
}

/// Sink that logs state updates; stands in for the engine in local runs.
pub struct LoggingSink;

#[async_trait]
impl CompletionSink for LoggingSink {
    async fn state_updated(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
        state: CompletionState,
    ) {
        info!(
            activity = %activity_id,
            user = %user_id,
            state = state.as_str(),
            "completion state reported"
        );
    }
}

/// Sink that records every update, for tests.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<(ActivityId, UserId, CompletionState)>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the updates received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<(ActivityId, UserId, CompletionState)> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait]
impl CompletionSink for RecordingSink {
    async fn state_updated(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
        state: CompletionState,
    ) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push((activity_id, user_id, state));
        }
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Derives completion state from stored attempts and reports it onward.
///
/// The service keeps no state of its own: every answer is a fresh existence
/// check against the attempt store, which makes the `Incomplete` to
/// `Complete` transition monotonic under the append-only store.
pub struct CompletionService {
    attempts: Arc<dyn AttemptRepository>,
    sink: Arc<dyn CompletionSink>,
}

impl CompletionService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>, sink: Arc<dyn CompletionSink>) -> Self {
        Self { attempts, sink }
    }

    /// Derive the completion state for the pair.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Storage` when repository access fails.
    pub async fn evaluate(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<CompletionState, CompletionError> {
        let exists = self.attempts.has_completed(activity_id, user_id).await?;
        Ok(CompletionState::from_completed_exists(exists))
    }

    /// Re-evaluate after a completed attempt and push the state to the engine.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Storage` when the re-derivation fails; the
    /// sink itself has no error channel.
    pub async fn on_attempt_completed(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<CompletionState, CompletionError> {
        let state = self.evaluate(activity_id, user_id).await?;
        self.sink.state_updated(activity_id, user_id, state).await;
        Ok(state)
    }

    /// Answer the completion engine's rule query.
    ///
    /// Unknown rule names fail closed to `Incomplete`, and so does a storage
    /// failure: the engine contract has no error channel, and a wrong
    /// `Complete` is the only answer that cannot be corrected later.
    pub async fn custom_completion_state(
        &self,
        rule: &str,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> CompletionState {
        if rule != WATCH_COMPLETE_RULE {
            return CompletionState::Incomplete;
        }

        match self.evaluate(activity_id, user_id).await {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    activity = %activity_id,
                    user = %user_id,
                    error = %err,
                    "completion rule query failed, answering incomplete"
                );
                CompletionState::Incomplete
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use videotrack_core::model::Attempt;
    use videotrack_core::time::fixed_now;
    use storage::repository::{AttemptRecord, InMemoryRepository};

    fn service_over(repo: InMemoryRepository, sink: RecordingSink) -> CompletionService {
        CompletionService::new(Arc::new(repo), Arc::new(sink))
    }

    async fn append(repo: &InMemoryRepository, completed: bool) {
        let attempt = Attempt::new(
            ActivityId::new(7),
            UserId::new(3),
            30.0,
            completed,
            fixed_now(),
        )
        .unwrap();
        repo.append_attempt(AttemptRecord::from_attempt(&attempt))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_store_evaluates_incomplete() {
        let service = service_over(InMemoryRepository::new(), RecordingSink::new());
        let state = service
            .evaluate(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(state, CompletionState::Incomplete);
    }

    #[tokio::test]
    async fn unfinished_attempts_do_not_complete() {
        let repo = InMemoryRepository::new();
        append(&repo, false).await;
        append(&repo, false).await;

        let service = service_over(repo, RecordingSink::new());
        let state = service
            .evaluate(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(state, CompletionState::Incomplete);
    }

    #[tokio::test]
    async fn one_completed_attempt_completes_the_pair() {
        let repo = InMemoryRepository::new();
        append(&repo, false).await;
        append(&repo, true).await;

        let service = service_over(repo, RecordingSink::new());
        let state = service
            .evaluate(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();
        assert_eq!(state, CompletionState::Complete);
    }

    #[tokio::test]
    async fn attempt_completed_notifies_the_sink() {
        let repo = InMemoryRepository::new();
        append(&repo, true).await;
        let sink = RecordingSink::new();

        let service = service_over(repo, sink.clone());
        let state = service
            .on_attempt_completed(ActivityId::new(7), UserId::new(3))
            .await
            .unwrap();

        assert_eq!(state, CompletionState::Complete);
        assert_eq!(
            sink.events(),
            vec![(ActivityId::new(7), UserId::new(3), CompletionState::Complete)]
        );
    }

    #[tokio::test]
    async fn unknown_rule_fails_closed() {
        let repo = InMemoryRepository::new();
        append(&repo, true).await;

        let service = service_over(repo, RecordingSink::new());
        let state = service
            .custom_completion_state("someotherrule", ActivityId::new(7), UserId::new(3))
            .await;
        assert_eq!(state, CompletionState::Incomplete);
    }

    #[tokio::test]
    async fn known_rule_answers_from_the_store() {
        let repo = InMemoryRepository::new();
        append(&repo, true).await;

        let service = service_over(repo, RecordingSink::new());
        let state = service
            .custom_completion_state(WATCH_COMPLETE_RULE, ActivityId::new(7), UserId::new(3))
            .await;
        assert_eq!(state, CompletionState::Complete);
    }
}
