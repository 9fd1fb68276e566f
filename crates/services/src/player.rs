use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use videotrack_core::guard::{PlaybackGuard, SeekDecision};
use videotrack_core::model::{Activity, ActivityId, ActivitySettings, UserId};

use crate::gateway::{ProgressGateway, SubmitAck};

//
// ─── VIDEO BINDING ─────────────────────────────────────────────────────────────
//

/// The embedded video element found on an activity page.
///
/// Absence of a binding means the page rendered without a video; the player
/// session refuses to attach rather than fail later on a missing element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoBinding {
    /// Duration in seconds, when the element's metadata has loaded.
    pub duration: Option<f64>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Client-side controller for one video on one activity page.
///
/// Owns the playback guard and the transport. Event handlers are
/// non-blocking: the unload submission is spawned and never awaited, and a
/// lost write is logged and dropped, matching the page's fire-and-forget
/// constraint.
pub struct PlayerSession {
    activity_id: ActivityId,
    user_id: UserId,
    settings: ActivitySettings,
    guard: PlaybackGuard,
    gateway: Arc<dyn ProgressGateway>,
}

impl PlayerSession {
    /// Bind a session to the page's video element.
    ///
    /// Returns `None` when the page has no video element; no listeners are
    /// attached and no requests are made.
    #[must_use]
    pub fn attach(
        activity: &Activity,
        user_id: UserId,
        video: Option<VideoBinding>,
        gateway: Arc<dyn ProgressGateway>,
    ) -> Option<Self> {
        let _ = video?;
        Some(Self {
            activity_id: activity.id(),
            user_id,
            settings: activity.settings(),
            guard: PlaybackGuard::new(activity.settings().prevent_forward_seeking()),
            gateway,
        })
    }

    /// Fetch the resume point and seed the guard on the first playable frame.
    ///
    /// Returns the position to seek the video to, if any. The fetch races
    /// user interaction; the guard applies the seed at most once, so a late
    /// response after playback started is a no-op. A transport failure means
    /// playback simply starts from the beginning.
    pub async fn initialize(&mut self) -> Option<f64> {
        if !self.settings.resume_playback() {
            return self.guard.initialize(None);
        }

        match self
            .gateway
            .fetch_resume_point(self.activity_id, self.user_id)
            .await
        {
            Ok(point) => self.guard.initialize(point),
            Err(err) => {
                warn!(
                    activity = %self.activity_id,
                    error = %err,
                    "resume fetch failed, starting from the beginning"
                );
                self.guard.initialize(None)
            }
        }
    }

    /// Playback time update from the video element.
    pub fn time_update(&mut self, current_time: f64, seeking: bool) {
        self.guard.on_time_update(current_time, seeking);
    }

    /// Check a seek target; `ClampTo` means force playback back.
    #[must_use]
    pub fn seek_attempt(&self, target_time: f64) -> SeekDecision {
        self.guard.on_seek_attempt(target_time)
    }

    /// Playback restarted after a submission; opens a new session.
    pub fn play_resumed(&mut self) {
        self.guard.on_play_resumed();
    }

    /// The video reached its natural end: submit a completed attempt.
    ///
    /// This path is not unload-constrained, so the submission is awaited.
    /// Transport failures are logged and dropped.
    pub async fn finish(&mut self, duration: f64) -> Option<SubmitAck> {
        let draft = self.guard.on_video_ended(duration)?;

        match self
            .gateway
            .submit_attempt(self.activity_id, self.user_id, draft)
            .await
        {
            Ok(ack) => {
                debug!(activity = %self.activity_id, ?ack, "completed attempt submitted");
                Some(ack)
            }
            Err(err) => {
                warn!(
                    activity = %self.activity_id,
                    error = %err,
                    "completed attempt submission lost"
                );
                None
            }
        }
    }

    /// The page is unloading: submit partial progress without blocking.
    ///
    /// The submission is spawned and the handle returned so tests can await
    /// it; the unload path never does. There is no retry and no delivery
    /// confirmation.
    pub fn end_session(&mut self) -> Option<JoinHandle<()>> {
        let draft = self.guard.on_session_end()?;

        let gateway = Arc::clone(&self.gateway);
        let activity_id = self.activity_id;
        let user_id = self.user_id;
        Some(tokio::spawn(async move {
            if let Err(err) = gateway.submit_attempt(activity_id, user_id, draft).await {
                warn!(
                    activity = %activity_id,
                    error = %err,
                    "unload attempt submission lost"
                );
            }
        }))
    }

    #[must_use]
    pub fn guard(&self) -> &PlaybackGuard {
        &self.guard
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
