use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a match as issued by the collaborator (usually a page URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRef(String);

impl MatchRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Last path segment, used to label a match in messages.
    pub fn tail(&self) -> &str {
        let trimmed = self.0.trim().trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, tail)) if !tail.is_empty() => tail,
            _ => trimmed,
        }
    }
}

impl fmt::Display for MatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MatchRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Live,
    Past,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Live => "live",
            MatchKind::Past => "past",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
