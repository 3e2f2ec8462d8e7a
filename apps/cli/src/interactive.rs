//! Line-driven event loop. Long operations run on their own tasks so input keeps
//! flowing while a request is in flight.

use std::sync::Arc;

use anyhow::Result;
use client_core::{
    Admission, AudioSink, FeedbackOutcome, PlaybackTrigger, SessionController, SessionEvent,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    commands::{parse_action, Action, HELP},
    view,
};

pub async fn run(controller: Arc<SessionController>, sink: Arc<dyn AudioSink>) -> Result<()> {
    let playback = PlaybackTrigger::new(sink).spawn(controller.subscribe_events());
    let notices = spawn_notice_printer(Arc::clone(&controller));

    println!("{HELP}");
    spawn_catalog_load(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let action = match parse_action(&line) {
            Ok(action) => action,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        debug!(?action, "interactive action");

        match action {
            Action::Reload => spawn_catalog_load(&controller),
            Action::List => {
                let snapshot = controller.snapshot().await;
                print!("{}", view::render_catalog(&snapshot.catalog));
            }
            Action::Select(selector) => {
                let catalog = controller.snapshot().await.catalog;
                match selector.resolve(&catalog) {
                    Ok(match_ref) => {
                        let controller = Arc::clone(&controller);
                        tokio::spawn(async move {
                            if controller.request_commentary(match_ref).await == Admission::Busy {
                                println!("commentary is still being generated; wait for it to finish");
                            }
                        });
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Action::Rate { score, comment } => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    match controller.submit_feedback(score, comment.as_deref()).await {
                        FeedbackOutcome::NothingToRate => println!("nothing to rate yet"),
                        FeedbackOutcome::InvalidScore => println!("score must be between 1 and 5"),
                        // Reported through session events.
                        FeedbackOutcome::Submitted { .. } | FeedbackOutcome::Failed => {}
                    }
                });
            }
            Action::Status => print!("{}", view::render_snapshot(&controller.snapshot().await)),
            Action::Health => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    match controller.check_health().await {
                        Ok(health) => print!("{}", view::render_health(&health)),
                        Err(err) => println!("health check failed: {err}"),
                    }
                });
            }
            Action::Help => println!("{HELP}"),
            Action::Quit => break,
        }
    }

    playback.abort();
    notices.abort();
    Ok(())
}

fn spawn_catalog_load(controller: &Arc<SessionController>) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        if controller.load_catalog().await == Admission::Busy {
            println!("matches are already loading");
        }
    });
}

fn spawn_notice_printer(controller: Arc<SessionController>) -> JoinHandle<()> {
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            if let SessionEvent::CommentaryReady { .. } = event {
                print!("{}", view::render_snapshot(&controller.snapshot().await));
            } else if let Some(notice) = view::event_notice(&event) {
                println!("{notice}");
            }
        }
    })
}
