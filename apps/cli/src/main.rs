use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AudioSink, FeedbackOutcome, HttpCollaborator, PlaybackTrigger, SessionController,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod interactive;
mod player;
mod view;

use commands::MatchSelector;
use config::load_settings;
use player::ExternalPlayerSink;

#[derive(Parser, Debug)]
#[command(
    name = "commentary",
    version,
    about = "Browse matches and play generated commentary"
)]
struct Cli {
    /// Config file (defaults to ./commentary.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    audio_dir: Option<PathBuf>,
    /// Audio player command, e.g. "aplay" or "mpv --no-video".
    #[arg(long)]
    player: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List live and past matches.
    Matches,
    /// Generate commentary for a match (URL, or live:N / past:N) and play it.
    Play {
        target: String,
        /// Rate the result from 1 to 5 once it is shown.
        #[arg(long)]
        rate: Option<i32>,
        #[arg(long, requires = "rate")]
        comment: Option<String>,
    },
    /// Report the backend's dependency status.
    Health,
    /// Read commands from stdin (the default).
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(v) = cli.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = cli.audio_dir {
        settings.audio_dir = v;
    }
    if let Some(v) = cli.player {
        settings.player_command = Some(v);
    }

    let base_url = settings.backend_base_url()?;
    let collaborator = Arc::new(match settings.request_timeout() {
        Some(timeout) => HttpCollaborator::with_timeout(base_url, timeout)?,
        None => HttpCollaborator::new(base_url),
    });
    let controller = SessionController::new(collaborator.clone());
    let player = Arc::new(ExternalPlayerSink::new(
        collaborator,
        &settings.audio_dir,
        settings.player_command.as_deref(),
    ));
    let sink: Arc<dyn AudioSink> = player.clone();
    tracing::info!(backend = %settings.backend_url, "commentary client started");

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Matches => list_matches(&controller).await,
        Command::Play {
            target,
            rate,
            comment,
        } => {
            play(&controller, sink, &target, rate, comment.as_deref()).await?;
            // Let the clip finish before the process exits.
            player.wait().await
        }
        Command::Health => {
            let health = controller.check_health().await?;
            print!("{}", view::render_health(&health));
            Ok(())
        }
        Command::Interactive => interactive::run(controller, sink).await,
    }
}

async fn list_matches(controller: &SessionController) -> Result<()> {
    controller.load_catalog().await;
    let snapshot = controller.snapshot().await;
    if let Some(note) = snapshot.error_note {
        bail!(note);
    }
    print!("{}", view::render_catalog(&snapshot.catalog));
    Ok(())
}

async fn play(
    controller: &SessionController,
    sink: Arc<dyn AudioSink>,
    target: &str,
    rate: Option<i32>,
    comment: Option<&str>,
) -> Result<()> {
    let selector: MatchSelector = target.parse()?;
    if selector.needs_catalog() {
        controller.load_catalog().await;
        if let Some(note) = controller.snapshot().await.error_note {
            bail!(note);
        }
    }
    let match_ref = selector.resolve(&controller.snapshot().await.catalog)?;

    let mut events = controller.subscribe_events();
    let mut trigger = PlaybackTrigger::new(sink);
    controller.request_commentary(match_ref).await;
    while let Ok(event) = events.try_recv() {
        trigger.handle(&event).await;
    }

    let snapshot = controller.snapshot().await;
    print!("{}", view::render_snapshot(&snapshot));
    if let Some(note) = snapshot.error_note {
        return Err(anyhow!(note));
    }

    let Some(score) = rate else {
        return Ok(());
    };
    match controller.submit_feedback(score, comment).await {
        FeedbackOutcome::Submitted { message } => {
            println!("{message}");
            Ok(())
        }
        FeedbackOutcome::NothingToRate => {
            println!("nothing to rate: the backend returned no commentary text");
            Ok(())
        }
        FeedbackOutcome::InvalidScore => bail!("score must be between 1 and 5"),
        FeedbackOutcome::Failed => {
            let note = controller.snapshot().await.error_note;
            Err(anyhow!(note.unwrap_or_else(|| "feedback failed".to_string())))
        }
    }
}
