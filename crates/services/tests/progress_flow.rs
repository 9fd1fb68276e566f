//! End-to-end flow over in-memory storage: record partial progress, resume,
//! complete, and verify the completion gate.

use std::sync::Arc;

use chrono::Duration;
use services::{
    AppServices, CompletionService, RecordingSink, SubmitOutcome, WATCH_COMPLETE_RULE,
};
use storage::repository::{ActivityRepository, AttemptRepository};
use videotrack_core::model::{
    Activity, ActivityId, ActivitySettings, AttemptDraft, CompletionState, UserId,
};
use videotrack_core::time::{Clock, fixed_now};

fn activity_id() -> ActivityId {
    ActivityId::new(7)
}

fn user_id() -> UserId {
    UserId::new(3)
}

async fn bootstrap(sink: RecordingSink) -> AppServices {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()), Arc::new(sink));
    let activity = Activity::new(
        activity_id(),
        "Intro lecture",
        "https://cdn.example.org/intro.mp4",
        ActivitySettings::new(true, true),
        fixed_now(),
    )
    .unwrap();
    services.activities().upsert_activity(&activity).await.unwrap();
    services
}

#[tokio::test]
async fn watch_resume_complete_flow() {
    let sink = RecordingSink::new();
    let services = bootstrap(sink.clone()).await;

    // First session stops at 10 seconds.
    let outcome = services
        .attempts()
        .submit_attempt(activity_id(), user_id(), AttemptDraft::partial(10.0))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Recorded { .. }));

    let rows = services
        .storage()
        .attempts
        .attempts_for(activity_id(), user_id())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    // The next page load resumes from there.
    let point = services.resume().resume_point(activity_id(), user_id()).await.unwrap();
    assert_eq!(point, Some(10.0));

    // Second session reaches the end.
    let outcome = services
        .attempts()
        .submit_attempt(activity_id(), user_id(), AttemptDraft::finished(30.0))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Recorded { .. }));

    let state = services.completion().evaluate(activity_id(), user_id()).await.unwrap();
    assert_eq!(state, CompletionState::Complete);
    assert_eq!(
        sink.events(),
        vec![(activity_id(), user_id(), CompletionState::Complete)]
    );

    // Any further submission is skipped and the store stays unchanged.
    let outcome = services
        .attempts()
        .submit_attempt(activity_id(), user_id(), AttemptDraft::finished(5.0))
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Skipped);

    let rows = services
        .storage()
        .attempts
        .attempts_for(activity_id(), user_id())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn repeated_partial_sessions_resume_from_the_newest_row() {
    let services = bootstrap(RecordingSink::new()).await;

    // Three partial sessions at increasing times; the recorder stamps each
    // insert with its clock, so re-create the service with a later clock for
    // each session the way separate requests would see time move.
    for (i, watched) in [10.0, 25.0, 42.5].into_iter().enumerate() {
        let clock = Clock::fixed(fixed_now() + Duration::minutes(i64::try_from(i).unwrap()));
        let recorder = services_with_clock(&services, clock);
        recorder
            .submit_attempt(activity_id(), user_id(), AttemptDraft::partial(watched))
            .await
            .unwrap();
    }

    let point = services.resume().resume_point(activity_id(), user_id()).await.unwrap();
    assert_eq!(point, Some(42.5));

    let rows = services
        .storage()
        .attempts
        .attempts_for(activity_id(), user_id())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn completion_rule_gate_follows_the_store() {
    let sink = RecordingSink::new();
    let services = bootstrap(sink.clone()).await;
    let completion = services.completion();

    assert_eq!(
        completion
            .custom_completion_state(WATCH_COMPLETE_RULE, activity_id(), user_id())
            .await,
        CompletionState::Incomplete
    );

    services
        .attempts()
        .submit_attempt(activity_id(), user_id(), AttemptDraft::finished(30.0))
        .await
        .unwrap();

    assert_eq!(
        completion
            .custom_completion_state(WATCH_COMPLETE_RULE, activity_id(), user_id())
            .await,
        CompletionState::Complete
    );

    // Unknown rules fail closed even when the pair is complete.
    assert_eq!(
        completion
            .custom_completion_state("viewcount", activity_id(), user_id())
            .await,
        CompletionState::Incomplete
    );
}

fn services_with_clock(services: &AppServices, clock: Clock) -> services::AttemptService {
    let storage = services.storage();
    let completion = Arc::new(CompletionService::new(
        Arc::clone(&storage.attempts),
        Arc::new(RecordingSink::new()),
    ));
    services::AttemptService::new(
        clock,
        Arc::clone(&storage.activities),
        Arc::clone(&storage.attempts),
        completion,
    )
}
