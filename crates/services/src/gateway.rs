use async_trait::async_trait;
use serde::Deserialize;

use videotrack_core::model::{ActivityId, AttemptDraft, UserId};

use crate::error::TransportError;

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Server acknowledgement of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAck {
    Recorded,
    Skipped,
}

/// Transport used by the player session to reach the progress endpoint.
#[async_trait]
pub trait ProgressGateway: Send + Sync {
    /// Fetch the resume position, `None` when the server has no unfinished
    /// attempt for the pair.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the request fails or the response does
    /// not parse.
    async fn fetch_resume_point(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<f64>, TransportError>;

    /// Submit an attempt draft.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the request fails outright. A response
    /// that arrives but is not `"skipped"` counts as `Recorded`.
    async fn submit_attempt(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
        draft: AttemptDraft,
    ) -> Result<SubmitAck, TransportError>;
}

//
// ─── HTTP IMPLEMENTATION ───────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct ProgressEnvelope {
    status: String,
    #[serde(default)]
    time_watched: f64,
}

/// Gateway speaking the progress endpoint's wire format.
///
/// Resume is a GET with `cmid`/`user` query parameters; submission is a
/// form-encoded POST with `time_watched` in decimal seconds and `completed`
/// as 0/1.
pub struct HttpProgressGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProgressGateway {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn progress_url(&self) -> String {
        format!("{}/progress", self.base_url)
    }
}

#[async_trait]
impl ProgressGateway for HttpProgressGateway {
    async fn fetch_resume_point(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<f64>, TransportError> {
        let response = self
            .client
            .get(self.progress_url())
            .query(&[
                ("cmid", activity_id.value()),
                ("user", user_id.value()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }

        let envelope: ProgressEnvelope = response.json().await?;
        match envelope.status.as_str() {
            "success" => Ok(Some(envelope.time_watched)),
            "notfound" => Ok(None),
            other => Err(TransportError::Malformed(format!(
                "unexpected resume status: {other}"
            ))),
        }
    }

    async fn submit_attempt(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
        draft: AttemptDraft,
    ) -> Result<SubmitAck, TransportError> {
        let form = [
            ("cmid", activity_id.to_string()),
            ("user", user_id.to_string()),
            ("time_watched", draft.watched_seconds.to_string()),
            ("completed", u8::from(draft.completed).to_string()),
        ];

        let response = self
            .client
            .post(self.progress_url())
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }

        // Any non-error response that is not an explicit skip is an ack.
        match response.json::<ProgressEnvelope>().await {
            Ok(envelope) if envelope.status == "skipped" => Ok(SubmitAck::Skipped),
            _ => Ok(SubmitAck::Recorded),
        }
    }
}
