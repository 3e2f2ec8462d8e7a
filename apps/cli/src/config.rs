use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::normalize_base_url;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "commentary.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub audio_dir: PathBuf,
    /// Command used to play downloaded audio, e.g. `aplay` or `mpv --no-video`.
    pub player_command: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            audio_dir: PathBuf::from("./data/audio"),
            player_command: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    audio_dir: Option<PathBuf>,
    player_command: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn backend_base_url(&self) -> anyhow::Result<Url> {
        normalize_base_url(&self.backend_url)
            .with_context(|| format!("invalid backend url '{}'", self.backend_url))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Defaults, then the config file (if present), then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file(&mut settings, &raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file(&mut settings, &raw).with_context(|| {
                    format!("failed to parse config file '{DEFAULT_CONFIG_FILE}'")
                })?;
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.audio_dir {
        settings.audio_dir = v;
    }
    if let Some(v) = file_cfg.player_command {
        settings.player_command = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("COMMENTARY_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("APP__AUDIO_DIR") {
        settings.audio_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__PLAYER") {
        let v = v.trim().to_string();
        settings.player_command = (!v.is_empty()).then_some(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}
