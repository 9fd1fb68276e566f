use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::ids::ActivityId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("activity name cannot be empty")]
    EmptyName,

    #[error("invalid video url: {raw}")]
    InvalidVideoUrl { raw: String },
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Per-activity playback settings.
///
/// These gate what the playback guard does on the client; they never gate
/// attempt recording on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySettings {
    prevent_forward_seeking: bool,
    resume_playback: bool,
}

impl ActivitySettings {
    #[must_use]
    pub fn new(prevent_forward_seeking: bool, resume_playback: bool) -> Self {
        Self {
            prevent_forward_seeking,
            resume_playback,
        }
    }

    /// Whether seeks past the watched high-water mark are clamped.
    #[must_use]
    pub fn prevent_forward_seeking(&self) -> bool {
        self.prevent_forward_seeking
    }

    /// Whether playback starts from the last unfinished position.
    #[must_use]
    pub fn resume_playback(&self) -> bool {
        self.resume_playback
    }
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            prevent_forward_seeking: false,
            resume_playback: true,
        }
    }
}

//
// ─── ACTIVITY ──────────────────────────────────────────────────────────────────
//

/// A learning-activity page with one embedded video.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    id: ActivityId,
    name: String,
    video_url: Url,
    settings: ActivitySettings,
    created_at: DateTime<Utc>,
}

impl Activity {
    /// Creates an activity, validating name and video source.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::EmptyName` if the name is blank, or
    /// `ActivityError::InvalidVideoUrl` if the video source does not parse.
    pub fn new(
        id: ActivityId,
        name: impl Into<String>,
        video_url: &str,
        settings: ActivitySettings,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ActivityError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ActivityError::EmptyName);
        }

        let video_url = Url::parse(video_url).map_err(|_| ActivityError::InvalidVideoUrl {
            raw: video_url.to_string(),
        })?;

        Ok(Self {
            id,
            name,
            video_url,
            settings,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ActivityId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn video_url(&self) -> &Url {
        &self.video_url
    }

    #[must_use]
    pub fn settings(&self) -> ActivitySettings {
        self.settings
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
