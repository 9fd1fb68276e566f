use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ActivityId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur when building an attempt.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("watched seconds must be a finite, non-negative number, got {0}")]
    InvalidWatchedSeconds(f64),
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One persisted record of a user's watch session.
///
/// An attempt stores the furthest contiguous point reached in a session and
/// whether the session hit the video's natural end. Attempts are immutable
/// once written: resuming never rewrites an earlier row, it only reads the
/// newest unfinished one.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    activity_id: ActivityId,
    user_id: UserId,
    watched_seconds: f64,
    completed: bool,
    recorded_at: DateTime<Utc>,
}

impl Attempt {
    /// Creates an attempt, validating the watched time.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidWatchedSeconds` if `watched_seconds` is
    /// negative, NaN, or infinite.
    pub fn new(
        activity_id: ActivityId,
        user_id: UserId,
        watched_seconds: f64,
        completed: bool,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if !watched_seconds.is_finite() || watched_seconds < 0.0 {
            return Err(AttemptError::InvalidWatchedSeconds(watched_seconds));
        }

        Ok(Self {
            activity_id,
            user_id,
            watched_seconds,
            completed,
            recorded_at,
        })
    }

    #[must_use]
    pub fn activity_id(&self) -> ActivityId {
        self.activity_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn watched_seconds(&self) -> f64 {
        self.watched_seconds
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A submission the player has produced but not yet sent.
///
/// Drafts carry no identity or timestamp; the recorder stamps the server
/// clock and validates on insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptDraft {
    pub watched_seconds: f64,
    pub completed: bool,
}

impl AttemptDraft {
    /// Draft for a session that stopped short of the end.
    #[must_use]
    pub fn partial(watched_seconds: f64) -> Self {
        Self {
            watched_seconds,
            completed: false,
        }
    }

    /// Draft for a session that reached the video's natural end.
    #[must_use]
    pub fn finished(duration: f64) -> Self {
        Self {
            watched_seconds: duration,
            completed: true,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn attempt_creation_works() {
        let attempt = Attempt::new(
            ActivityId::new(7),
            UserId::new(3),
            42.5,
            false,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(attempt.activity_id(), ActivityId::new(7));
        assert_eq!(attempt.user_id(), UserId::new(3));
        assert_eq!(attempt.watched_seconds(), 42.5);
        assert!(!attempt.completed());
    }

    #[test]
    fn negative_watched_seconds_is_rejected() {
        let err = Attempt::new(ActivityId::new(1), UserId::new(1), -0.5, false, fixed_now())
            .unwrap_err();
        assert!(matches!(err, AttemptError::InvalidWatchedSeconds(_)));
    }

    #[test]
    fn non_finite_watched_seconds_is_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = Attempt::new(ActivityId::new(1), UserId::new(1), bad, true, fixed_now());
            assert!(result.is_err());
        }
    }

    #[test]
    fn zero_watched_seconds_is_valid() {
        let attempt =
            Attempt::new(ActivityId::new(1), UserId::new(1), 0.0, false, fixed_now()).unwrap();
        assert_eq!(attempt.watched_seconds(), 0.0);
    }

    #[test]
    fn draft_constructors_set_completion() {
        assert!(!AttemptDraft::partial(12.0).completed);
        assert!(AttemptDraft::finished(120.0).completed);
        assert_eq!(AttemptDraft::finished(120.0).watched_seconds, 120.0);
    }
}
