use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{MatchKind, MatchRef},
    error::ApiError,
    protocol::{
        FeedbackRequest, FeedbackResponse, HealthResponse, MatchListResponse,
        ScrapeCommentaryRequest, ScrapeCommentaryResponse, FEEDBACK_PATH, HEALTH_PATH,
        LIVE_MATCHES_PATH, PAST_MATCHES_PATH, SCRAPE_COMMENTARY_PATH,
    },
};
use tracing::debug;
use url::Url;

pub mod error;
pub mod playback;
pub mod session;

pub use error::{CollaboratorError, ErrorCategory};
pub use playback::{AudioRef, AudioSink, PlaybackTrigger};
pub use session::{
    Admission, CommentaryResult, FeedbackOutcome, MatchCatalog, SessionController, SessionEvent,
    SessionSnapshot, SessionStatus, TextSlot, UNAVAILABLE,
};

const MAX_RAW_DETAIL_CHARS: usize = 200;

/// The remote service that scrapes matches, writes commentary and synthesizes audio.
#[async_trait]
pub trait Collaborator: Send + Sync {
    fn base_url(&self) -> &Url;
    async fn list_matches(&self, kind: MatchKind) -> Result<Vec<MatchRef>, CollaboratorError>;
    async fn generate_commentary(
        &self,
        match_ref: &MatchRef,
    ) -> Result<ScrapeCommentaryResponse, CollaboratorError>;
    async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, CollaboratorError>;
    async fn health(&self) -> Result<HealthResponse, CollaboratorError>;
}

/// Trailing `/` keeps the backend mount path when joining relative paths.
pub fn normalize_base_url(raw: &str) -> Result<Url, CollaboratorError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CollaboratorError::InvalidUrl("empty backend url".into()));
    }
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(CollaboratorError::InvalidUrl(format!(
            "'{raw}' cannot be used as a base address"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub struct HttpCollaborator {
    http: Client,
    base_url: Url,
}

impl HttpCollaborator {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, CollaboratorError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: Url, http: Client) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url, CollaboratorError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn fetch_audio(&self, audio: &AudioRef) -> Result<Vec<u8>, CollaboratorError> {
        let res = self.http.get(audio.url().clone()).send().await?;
        let res = ensure_success(res).await?;
        Ok(res.bytes().await?.to_vec())
    }
}

async fn ensure_success(res: Response) -> Result<Response, CollaboratorError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.detail_text(),
        Err(_) => {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(MAX_RAW_DETAIL_CHARS).collect())
        }
    };
    Err(CollaboratorError::Status {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, CollaboratorError> {
    let res = ensure_success(res).await?;
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| CollaboratorError::Malformed(err.to_string()))
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn list_matches(&self, kind: MatchKind) -> Result<Vec<MatchRef>, CollaboratorError> {
        let path = match kind {
            MatchKind::Live => LIVE_MATCHES_PATH,
            MatchKind::Past => PAST_MATCHES_PATH,
        };
        let res = self.http.get(self.endpoint(path)?).send().await?;
        let body: MatchListResponse = decode(res).await?;
        debug!(kind = %kind, count = body.matches.len(), "match list received");
        Ok(body.matches)
    }

    async fn generate_commentary(
        &self,
        match_ref: &MatchRef,
    ) -> Result<ScrapeCommentaryResponse, CollaboratorError> {
        let res = self
            .http
            .post(self.endpoint(SCRAPE_COMMENTARY_PATH)?)
            .json(&ScrapeCommentaryRequest {
                url: match_ref.clone(),
            })
            .send()
            .await?;
        decode(res).await
    }

    async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, CollaboratorError> {
        let res = self
            .http
            .post(self.endpoint(FEEDBACK_PATH)?)
            .json(request)
            .send()
            .await?;
        let res = ensure_success(res).await?;
        // An empty acknowledgement is still a success.
        let bytes = res.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(FeedbackResponse::default());
        }
        serde_json::from_slice(&bytes).map_err(|err| CollaboratorError::Malformed(err.to_string()))
    }

    async fn health(&self) -> Result<HealthResponse, CollaboratorError> {
        let res = self.http.get(self.endpoint(HEALTH_PATH)?).send().await?;
        decode(res).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
