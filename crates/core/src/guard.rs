//! Playback guard: per-page watch-progress state machine.
//!
//! The guard is bound to one video element and one activity at page load.
//! It owns the session state the player events mutate (high-water mark,
//! submission latch) and turns those events into commands: a one-shot resume
//! seek, a clamp target for forward seeks, and at most one attempt draft per
//! play session. It performs no I/O; the session controller in the services
//! layer drives it and talks to the server.

use crate::model::AttemptDraft;

/// Tolerance applied to forward-seek checks.
///
/// Player time updates and seek targets disagree by a few milliseconds on
/// real timers; without the tolerance a seek back to the current position
/// would be clamped.
pub const SEEK_TOLERANCE_SECONDS: f64 = 0.01;

//
// ─── SEEK DECISION ─────────────────────────────────────────────────────────────
//

/// Outcome of a seek attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekDecision {
    /// The seek may proceed to its target.
    Allow,
    /// The seek passed the watched high-water mark; force playback back to
    /// the contained position.
    ClampTo(f64),
}

//
// ─── GUARD ─────────────────────────────────────────────────────────────────────
//

/// State machine guarding a single video element.
///
/// `high_water_mark` is monotonically non-decreasing for the lifetime of the
/// page; `submitted` latches after the first draft of a play session and is
/// reopened only by [`PlaybackGuard::on_play_resumed`]. Both live here, on
/// the instance, never in module state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackGuard {
    prevent_forward_seeking: bool,
    high_water_mark: f64,
    submitted: bool,
    seeded: bool,
    ended: bool,
}

impl PlaybackGuard {
    #[must_use]
    pub fn new(prevent_forward_seeking: bool) -> Self {
        Self {
            prevent_forward_seeking,
            high_water_mark: 0.0,
            submitted: false,
            seeded: false,
            ended: false,
        }
    }

    /// Seeds the guard with a resume point on the first playable frame.
    ///
    /// Returns the position to seek the video to, or `None` when there is
    /// nothing to resume. Runs once: re-invocation after the first call is a
    /// no-op, which makes the resume fetch safe to race against user
    /// interaction.
    pub fn initialize(&mut self, resume_point: Option<f64>) -> Option<f64> {
        if self.seeded {
            return None;
        }
        self.seeded = true;

        match resume_point {
            Some(point) if point.is_finite() && point > 0.0 => {
                self.high_water_mark = point;
                Some(point)
            }
            _ => None,
        }
    }

    /// Advances the high-water mark from a playback time update.
    ///
    /// Updates arriving while the player is seeking are ignored: a seek in
    /// flight must not raise the ceiling it is being checked against.
    pub fn on_time_update(&mut self, current_time: f64, seeking: bool) {
        if seeking {
            return;
        }
        if current_time.is_finite() && current_time > self.high_water_mark {
            self.high_water_mark = current_time;
        }
    }

    /// Checks a seek target against the high-water mark.
    ///
    /// Forward seeks past `high_water_mark + SEEK_TOLERANCE_SECONDS` are
    /// clamped when the restriction is enabled; backward seeks always pass.
    #[must_use]
    pub fn on_seek_attempt(&self, target_time: f64) -> SeekDecision {
        if self.prevent_forward_seeking
            && target_time > self.high_water_mark + SEEK_TOLERANCE_SECONDS
        {
            SeekDecision::ClampTo(self.high_water_mark)
        } else {
            SeekDecision::Allow
        }
    }

    /// The video reached its natural end.
    ///
    /// Produces a completed draft for the full duration, unless this session
    /// already submitted.
    pub fn on_video_ended(&mut self, duration: f64) -> Option<AttemptDraft> {
        self.ended = true;
        if self.submitted {
            return None;
        }
        self.submitted = true;
        Some(AttemptDraft::finished(duration))
    }

    /// The page is being torn down.
    ///
    /// Produces a partial draft at the high-water mark, unless this session
    /// already submitted, the video ended, or nothing was watched.
    pub fn on_session_end(&mut self) -> Option<AttemptDraft> {
        if self.submitted || self.ended || self.high_water_mark <= 0.0 {
            return None;
        }
        self.submitted = true;
        Some(AttemptDraft::partial(self.high_water_mark))
    }

    /// Playback restarted: open a new session so a later end/unload can
    /// submit again. The high-water mark carries over.
    pub fn on_play_resumed(&mut self) {
        self.submitted = false;
        self.ended = false;
    }

    #[must_use]
    pub fn high_water_mark(&self) -> f64 {
        self.high_water_mark
    }

    #[must_use]
    pub fn has_submitted(&self) -> bool {
        self.submitted
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
