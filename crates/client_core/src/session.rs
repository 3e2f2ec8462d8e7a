//! Session controller: catalog loading, the commentary pipeline and feedback.
//!
//! All session state sits behind one mutex that is never held across a network
//! await, so every transition below is atomic with respect to the others.

use std::{fmt, sync::Arc};

use shared::{
    domain::{MatchKind, MatchRef},
    protocol::{FeedbackRequest, HealthResponse, ScrapeCommentaryResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{error::CollaboratorError, playback::AudioRef, Collaborator};

/// Shown for a field the backend left out of a successful response.
pub const UNAVAILABLE: &str = "(unavailable)";

pub const MIN_FEEDBACK_SCORE: i32 = 1;
pub const MAX_FEEDBACK_SCORE: i32 = 5;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Texts the backend substitutes when it could not produce real commentary.
const BACKEND_FAILURE_PREFIXES: &[&str] = &["(LLM processing failed", "(No commentary found"];
const BACKEND_UNAVAILABLE_MARKERS: &[&str] = &[
    "(Raw commentary unavailable)",
    "(Processed commentary unavailable)",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextSlot {
    #[default]
    Empty,
    /// Requested, but the backend had nothing for this field.
    Unavailable,
    Ready(String),
}

impl TextSlot {
    fn from_field(field: Option<String>) -> Self {
        match field {
            Some(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || BACKEND_UNAVAILABLE_MARKERS.contains(&trimmed) {
                    TextSlot::Unavailable
                } else {
                    TextSlot::Ready(text)
                }
            }
            None => TextSlot::Unavailable,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TextSlot::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TextSlot::Empty)
    }

    fn rateable(&self) -> Option<&str> {
        self.text().filter(|text| {
            let text = text.trim_start();
            !BACKEND_FAILURE_PREFIXES
                .iter()
                .any(|prefix| text.starts_with(prefix))
        })
    }
}

impl fmt::Display for TextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSlot::Empty => Ok(()),
            TextSlot::Unavailable => f.write_str(UNAVAILABLE),
            TextSlot::Ready(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentaryResult {
    pub raw_text: TextSlot,
    pub processed_text: TextSlot,
    pub audio_ref: Option<AudioRef>,
}

impl CommentaryResult {
    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty() && self.processed_text.is_empty() && self.audio_ref.is_none()
    }

    pub fn feedback_text(&self) -> Option<&str> {
        self.processed_text
            .rateable()
            .or_else(|| self.raw_text.rateable())
    }

    fn from_response(
        response: ScrapeCommentaryResponse,
        audio_ref: Option<AudioRef>,
    ) -> Self {
        Self {
            raw_text: TextSlot::from_field(response.raw_commentary),
            processed_text: TextSlot::from_field(response.processed_commentary),
            audio_ref,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCatalog {
    pub live: Vec<MatchRef>,
    pub past: Vec<MatchRef>,
}

impl MatchCatalog {
    pub fn matches(&self, kind: MatchKind) -> &[MatchRef] {
        match kind {
            MatchKind::Live => &self.live,
            MatchKind::Past => &self.past,
        }
    }

    pub fn get(&self, kind: MatchKind, index: usize) -> Option<&MatchRef> {
        self.matches(kind).get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    LoadingCatalog,
    LoadingCommentary,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Idle => "idle",
            SessionStatus::LoadingCatalog => "loading matches",
            SessionStatus::LoadingCommentary => "generating commentary",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// The same kind of operation is already in flight.
    Busy,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Submitted { message: String },
    NothingToRate,
    InvalidScore,
    Failed,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    CatalogLoaded { live: usize, past: usize },
    CatalogFailed { note: String },
    CommentaryStarted { match_ref: MatchRef },
    CommentaryReady {
        match_ref: MatchRef,
        audio: Option<AudioRef>,
    },
    CommentaryFailed { match_ref: MatchRef, note: String },
    FeedbackAccepted { message: String },
    FeedbackFailed { note: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub catalog: MatchCatalog,
    pub result: CommentaryResult,
    pub selected_match: Option<MatchRef>,
    pub status: SessionStatus,
    pub error_note: Option<String>,
}

#[derive(Default)]
struct SessionState {
    catalog: MatchCatalog,
    result: CommentaryResult,
    selected_match: Option<MatchRef>,
    error_note: Option<String>,
    catalog_loading: bool,
    commentary_loading: bool,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        if self.commentary_loading {
            SessionStatus::LoadingCommentary
        } else if self.catalog_loading {
            SessionStatus::LoadingCatalog
        } else {
            SessionStatus::Idle
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            catalog: self.catalog.clone(),
            result: self.result.clone(),
            selected_match: self.selected_match.clone(),
            status: self.status(),
            error_note: self.error_note.clone(),
        }
    }
}

pub struct SessionController {
    collaborator: Arc<dyn Collaborator>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(collaborator: Arc<dyn Collaborator>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            collaborator,
            state: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn load_catalog(&self) -> Admission {
        {
            let mut guard = self.state.lock().await;
            if guard.catalog_loading {
                return Admission::Busy;
            }
            guard.catalog_loading = true;
            guard.error_note = None;
        }

        // Either list failing empties both.
        info!("loading match catalog");
        let (live, past) = tokio::join!(
            self.collaborator.list_matches(MatchKind::Live),
            self.collaborator.list_matches(MatchKind::Past),
        );

        let event = {
            let mut guard = self.state.lock().await;
            guard.catalog_loading = false;
            match (live, past) {
                (Ok(live), Ok(past)) => {
                    info!(live = live.len(), past = past.len(), "match catalog loaded");
                    let event = SessionEvent::CatalogLoaded {
                        live: live.len(),
                        past: past.len(),
                    };
                    guard.catalog = MatchCatalog { live, past };
                    event
                }
                (live, past) => {
                    let note = [(MatchKind::Live, live.err()), (MatchKind::Past, past.err())]
                        .into_iter()
                        .filter_map(|(kind, err)| err.map(|err| catalog_failure_note(kind, &err)))
                        .collect::<Vec<_>>()
                        .join("; ");
                    warn!(note = %note, "match catalog load failed");
                    guard.catalog = MatchCatalog::default();
                    guard.error_note = Some(note.clone());
                    SessionEvent::CatalogFailed { note }
                }
            }
        };
        self.emit(event);
        Admission::Accepted
    }

    /// At most one request is in flight; later calls return `Busy` until it completes.
    pub async fn request_commentary(&self, match_ref: MatchRef) -> Admission {
        if match_ref.is_empty() {
            return Admission::Rejected;
        }

        {
            let mut guard = self.state.lock().await;
            if guard.commentary_loading {
                return Admission::Busy;
            }
            guard.selected_match = Some(match_ref.clone());
            guard.result = CommentaryResult::default();
            guard.error_note = None;
            guard.commentary_loading = true;
        }
        self.emit(SessionEvent::CommentaryStarted {
            match_ref: match_ref.clone(),
        });

        info!(match_ref = %match_ref, "requesting commentary");
        let outcome = self
            .collaborator
            .generate_commentary(&match_ref)
            .await
            .and_then(|response| self.build_result(response));

        let event = {
            let mut guard = self.state.lock().await;
            guard.commentary_loading = false;
            match outcome {
                Ok(result) => {
                    info!(
                        match_ref = %match_ref,
                        has_audio = result.audio_ref.is_some(),
                        "commentary ready"
                    );
                    let audio = result.audio_ref.clone();
                    guard.result = result;
                    SessionEvent::CommentaryReady {
                        match_ref: match_ref.clone(),
                        audio,
                    }
                }
                Err(err) => {
                    warn!(
                        match_ref = %match_ref,
                        category = %err.category(),
                        error = %err,
                        "commentary request failed"
                    );
                    let note = format!(
                        "Failed to get commentary for {}: {err}",
                        match_ref.tail()
                    );
                    guard.error_note = Some(note.clone());
                    SessionEvent::CommentaryFailed {
                        match_ref: match_ref.clone(),
                        note,
                    }
                }
            }
        };
        self.emit(event);
        Admission::Accepted
    }

    fn build_result(
        &self,
        response: ScrapeCommentaryResponse,
    ) -> Result<CommentaryResult, CollaboratorError> {
        let audio_ref = match response.audio_url.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => {
                Some(AudioRef::resolve(self.collaborator.base_url(), path)?)
            }
            _ => None,
        };
        Ok(CommentaryResult::from_response(response, audio_ref))
    }

    pub async fn submit_feedback(&self, score: i32, comment: Option<&str>) -> FeedbackOutcome {
        if !(MIN_FEEDBACK_SCORE..=MAX_FEEDBACK_SCORE).contains(&score) {
            return FeedbackOutcome::InvalidScore;
        }

        let commentary_text = {
            let mut guard = self.state.lock().await;
            let Some(text) = guard.result.feedback_text().map(str::to_owned) else {
                return FeedbackOutcome::NothingToRate;
            };
            guard.error_note = None;
            text
        };

        let request = FeedbackRequest {
            commentary_text,
            score,
            comment: comment.unwrap_or_default().trim().to_string(),
        };
        info!(score, "submitting feedback");
        match self.collaborator.submit_feedback(&request).await {
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Feedback submitted".to_string());
                self.emit(SessionEvent::FeedbackAccepted {
                    message: message.clone(),
                });
                FeedbackOutcome::Submitted { message }
            }
            Err(err) => {
                warn!(category = %err.category(), error = %err, "feedback submission failed");
                let note = format!("Failed to submit feedback: {err}");
                self.state.lock().await.error_note = Some(note.clone());
                self.emit(SessionEvent::FeedbackFailed { note });
                FeedbackOutcome::Failed
            }
        }
    }

    pub async fn check_health(&self) -> Result<HealthResponse, CollaboratorError> {
        self.collaborator.health().await
    }
}

fn catalog_failure_note(kind: MatchKind, err: &CollaboratorError) -> String {
    format!("Could not load {kind} matches: {err}")
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
