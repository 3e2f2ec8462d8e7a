//! Parsing of match selectors and interactive input lines.

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use client_core::MatchCatalog;
use shared::domain::{MatchKind, MatchRef};

/// A match named directly or by its 1-based position in the catalog (`live:2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSelector {
    Indexed { kind: MatchKind, position: usize },
    Direct(MatchRef),
}

impl MatchSelector {
    pub fn needs_catalog(&self) -> bool {
        matches!(self, MatchSelector::Indexed { .. })
    }

    pub fn resolve(&self, catalog: &MatchCatalog) -> Result<MatchRef> {
        match self {
            MatchSelector::Direct(match_ref) => Ok(match_ref.clone()),
            MatchSelector::Indexed { kind, position } => catalog
                .get(*kind, position - 1)
                .cloned()
                .ok_or_else(|| {
                    anyhow!(
                        "no {kind} match #{position} (catalog has {})",
                        catalog.matches(*kind).len()
                    )
                }),
        }
    }
}

impl FromStr for MatchSelector {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("match must not be empty");
        }

        let indexed = raw
            .split_once(':')
            .and_then(|(prefix, rest)| {
                let kind = match prefix.to_ascii_lowercase().as_str() {
                    "live" => MatchKind::Live,
                    "past" => MatchKind::Past,
                    _ => return None,
                };
                Some((kind, rest))
            });

        match indexed {
            Some((kind, rest)) => {
                let position = rest
                    .parse::<usize>()
                    .map_err(|_| anyhow!("'{rest}' is not a {kind} match number"))?;
                if position == 0 {
                    bail!("match numbers start at 1");
                }
                Ok(MatchSelector::Indexed { kind, position })
            }
            None => Ok(MatchSelector::Direct(MatchRef::new(raw))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reload,
    List,
    Select(MatchSelector),
    Rate {
        score: i32,
        comment: Option<String>,
    },
    Status,
    Health,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  reload                      reload live and past matches
  list                        show the match catalog
  select <match|live:N|past:N> generate commentary for a match
  rate <1-5> [comment]        rate the commentary on screen
  status                      show the session state
  health                      check the backend
  quit                        leave";

pub fn parse_action(line: &str) -> Result<Action> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "reload" | "r" => Action::Reload,
        "list" | "ls" => Action::List,
        "select" | "s" | "play" => Action::Select(rest.parse()?),
        "rate" => {
            let (score, comment) = match rest.split_once(char::is_whitespace) {
                Some((score, comment)) => (score, Some(comment.trim().to_string())),
                None => (rest, None),
            };
            let score = score
                .parse::<i32>()
                .map_err(|_| anyhow!("rate needs a score, e.g. 'rate 4 lively call'"))?;
            Action::Rate {
                score,
                comment: comment.filter(|c| !c.is_empty()),
            }
        }
        "status" => Action::Status,
        "health" => Action::Health,
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        "" => bail!("empty command; type 'help'"),
        other => bail!("unknown command '{other}'; type 'help'"),
    };
    Ok(action)
}
