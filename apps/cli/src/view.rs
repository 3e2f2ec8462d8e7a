use std::fmt::Write as _;

use client_core::{MatchCatalog, SessionEvent, SessionSnapshot};
use shared::{domain::MatchKind, protocol::HealthResponse};

pub fn render_catalog(catalog: &MatchCatalog) -> String {
    let mut out = String::new();
    for kind in [MatchKind::Live, MatchKind::Past] {
        let matches = catalog.matches(kind);
        let _ = writeln!(out, "{kind} matches ({}):", matches.len());
        if matches.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for (i, m) in matches.iter().enumerate() {
            let _ = writeln!(out, "  {kind}:{:<3} {}  [{}]", i + 1, m.tail(), m);
        }
    }
    out
}

pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status: {}", snapshot.status);
    if let Some(selected) = &snapshot.selected_match {
        let _ = writeln!(out, "match: {}", selected.tail());
    }
    if !snapshot.result.is_empty() {
        let result = &snapshot.result;
        let _ = writeln!(out, "raw: {}", result.raw_text);
        let _ = writeln!(out, "commentary: {}", result.processed_text);
        match &result.audio_ref {
            Some(audio) => {
                let _ = writeln!(out, "audio: {audio}");
            }
            None => {
                let _ = writeln!(out, "audio: none");
            }
        }
    }
    if let Some(note) = &snapshot.error_note {
        let _ = writeln!(out, "error: {note}");
    }
    out
}

pub fn render_health(health: &HealthResponse) -> String {
    let deps = &health.dependencies;
    format!(
        "backend: {}\n  webdriver: {}\n  llm_model: {}\n  tts_model: {}\n",
        health.status, deps.webdriver, deps.llm_model, deps.tts_model
    )
}

/// One-line notice for events worth telling the user about as they happen.
pub fn event_notice(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::CatalogLoaded { live, past } => {
            Some(format!("loaded {live} live and {past} past matches"))
        }
        SessionEvent::CatalogFailed { note }
        | SessionEvent::CommentaryFailed { note, .. }
        | SessionEvent::FeedbackFailed { note } => Some(format!("error: {note}")),
        SessionEvent::CommentaryStarted { match_ref } => {
            Some(format!("generating commentary for {}...", match_ref.tail()))
        }
        SessionEvent::FeedbackAccepted { message } => Some(message.clone()),
        SessionEvent::CommentaryReady { .. } => None,
    }
}
