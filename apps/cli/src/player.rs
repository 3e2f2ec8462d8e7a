//! Audio sink for the terminal client: downloads the asset and hands it to an
//! external player process.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use client_core::{AudioRef, AudioSink, HttpCollaborator};
use tokio::{
    process::{Child, Command},
    sync::Mutex,
};
use tracing::{debug, info};

const FALLBACK_FILE_NAME: &str = "commentary.wav";

pub struct ExternalPlayerSink {
    collaborator: Arc<HttpCollaborator>,
    audio_dir: PathBuf,
    player: Option<Vec<String>>,
    child: Mutex<Option<Child>>,
}

impl ExternalPlayerSink {
    pub fn new(
        collaborator: Arc<HttpCollaborator>,
        audio_dir: impl Into<PathBuf>,
        player_command: Option<&str>,
    ) -> Self {
        Self {
            collaborator,
            audio_dir: audio_dir.into(),
            player: player_command.and_then(split_command),
            child: Mutex::new(None),
        }
    }

    async fn store(&self, audio: &AudioRef) -> Result<PathBuf> {
        let bytes = self
            .collaborator
            .fetch_audio(audio)
            .await
            .with_context(|| format!("failed to download audio '{audio}'"))?;

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create audio directory '{}'",
                    self.audio_dir.display()
                )
            })?;
        let path = self.audio_dir.join(local_file_name(audio));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write audio file '{}'", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "audio stored");
        Ok(path)
    }

    fn spawn_player(&self, path: &Path) -> Result<Option<Child>> {
        let Some((program, args)) = self.player.as_ref().and_then(|cmd| cmd.split_first()) else {
            info!(path = %path.display(), "audio saved; no player configured");
            return Ok(None);
        };
        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start audio player '{program}'"))?;
        Ok(Some(child))
    }

    /// Blocks until the current player exits on its own.
    pub async fn wait(&self) -> Result<()> {
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            let status = child
                .wait()
                .await
                .context("failed to wait for audio player")?;
            debug!(%status, "audio player exited");
        }
        Ok(())
    }
}

#[async_trait]
impl AudioSink for ExternalPlayerSink {
    /// Stops the running player so the next `play` starts from the beginning.
    async fn rewind(&self) -> Result<()> {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            if child.try_wait()?.is_none() {
                child
                    .kill()
                    .await
                    .map_err(|err| anyhow!("failed to stop previous playback: {err}"))?;
            }
        }
        Ok(())
    }

    async fn play(&self, audio: &AudioRef) -> Result<()> {
        let path = self.store(audio).await?;
        let child = self.spawn_player(&path)?;
        *self.child.lock().await = child;
        Ok(())
    }
}

fn split_command(raw: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
    (!parts.is_empty()).then_some(parts)
}

/// Keeps only the asset's own file name so a backend path cannot escape the audio dir.
fn local_file_name(audio: &AudioRef) -> String {
    audio
        .file_name()
        .filter(|name| *name != ".." && *name != "." && !name.contains('\\'))
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn audio(raw: &str) -> AudioRef {
        let base = Url::parse("http://backend.test/").expect("base");
        AudioRef::resolve(&base, raw).expect("resolve")
    }

    #[test]
    fn splits_player_command_into_program_and_args() {
        assert_eq!(
            split_command("mpv  --no-video --really-quiet"),
            Some(vec![
                "mpv".to_string(),
                "--no-video".to_string(),
                "--really-quiet".to_string()
            ])
        );
        assert_eq!(split_command("   "), None);
    }

    #[test]
    fn local_file_name_uses_last_segment() {
        assert_eq!(
            local_file_name(&audio("/audio/commentary_42.wav")),
            "commentary_42.wav"
        );
    }

    #[test]
    fn local_file_name_falls_back_for_directory_urls() {
        assert_eq!(local_file_name(&audio("/audio/")), FALLBACK_FILE_NAME);
    }

    #[tokio::test]
    async fn rewind_without_player_is_noop() {
        let base = Url::parse("http://backend.test/").expect("base");
        let sink = ExternalPlayerSink::new(
            Arc::new(HttpCollaborator::new(base)),
            std::env::temp_dir(),
            None,
        );
        sink.rewind().await.expect("rewind");
        assert!(sink.child.lock().await.is_none());
    }

    #[cfg(unix)]
    fn slow_player(name: &str) -> (ExternalPlayerSink, PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "commentary-player-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let marker = dir.join("finished");
        let _ = std::fs::remove_file(&marker);
        let script = dir.join("player.sh");
        std::fs::write(
            &script,
            format!("sleep 1\ntouch '{}'\n", marker.display()),
        )
        .expect("script");

        let base = Url::parse("http://backend.test/").expect("base");
        let sink = ExternalPlayerSink::new(
            Arc::new(HttpCollaborator::new(base)),
            &dir,
            Some(&format!("sh {}", script.display())),
        );
        (sink, dir.join("commentary_1.wav"), marker)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn player_outlives_the_sink() {
        let (sink, audio_path, marker) = slow_player("outlives");
        let child = sink.spawn_player(&audio_path).expect("spawn");
        assert!(child.is_some());
        *sink.child.lock().await = child;

        drop(sink);
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        assert!(marker.exists(), "player was stopped before it finished");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wait_returns_after_player_finishes() {
        let (sink, audio_path, marker) = slow_player("wait");
        *sink.child.lock().await = sink.spawn_player(&audio_path).expect("spawn");

        sink.wait().await.expect("wait");

        assert!(marker.exists());
        assert!(sink.child.lock().await.is_none());
    }
}
