//! Starts audio playback when the pipeline publishes a new audio asset.

use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{error::CollaboratorError, session::SessionEvent};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioRef(Url);

impl AudioRef {
    pub fn resolve(base: &Url, relative: &str) -> Result<Self, CollaboratorError> {
        let relative = relative.trim();
        if relative.is_empty() {
            return Err(CollaboratorError::InvalidUrl("empty audio path".into()));
        }
        if let Ok(absolute) = Url::parse(relative) {
            if matches!(absolute.scheme(), "http" | "https") {
                return Ok(Self(absolute));
            }
        }
        // Anything else is a path under the base, even if it looks like `name:rest`.
        let path = format!("./{}", relative.trim_start_matches('/'));
        Ok(Self(base.join(&path)?))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Moves the playback position back to the start.
    async fn rewind(&self) -> Result<()>;
    async fn play(&self, audio: &AudioRef) -> Result<()>;
}

pub struct PlaybackTrigger {
    sink: Arc<dyn AudioSink>,
    current: Option<AudioRef>,
}

impl PlaybackTrigger {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&AudioRef> {
        self.current.as_ref()
    }

    /// Applies one session event. Returns `true` when playback was (re)started.
    pub async fn handle(&mut self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::CommentaryStarted { .. } | SessionEvent::CommentaryFailed { .. } => {
                self.current = None;
                false
            }
            SessionEvent::CommentaryReady { audio: None, .. } => {
                self.current = None;
                false
            }
            SessionEvent::CommentaryReady {
                audio: Some(audio), ..
            } => {
                if self.current.as_ref() == Some(audio) {
                    return false;
                }
                self.current = Some(audio.clone());
                self.start(audio).await;
                true
            }
            _ => false,
        }
    }

    async fn start(&self, audio: &AudioRef) {
        if let Err(err) = self.sink.rewind().await {
            warn!(error = %err, "failed to rewind audio output");
        }
        match self.sink.play(audio).await {
            Ok(()) => info!(audio = %audio, "playback started"),
            Err(err) => warn!(audio = %audio, error = %err, "playback could not start"),
        }
    }

    pub fn spawn(mut self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        self.handle(&event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "playback trigger lagged behind session events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("session event channel closed; playback trigger stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/playback_tests.rs"]
mod tests;
