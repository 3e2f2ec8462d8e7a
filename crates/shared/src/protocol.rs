use serde::{Deserialize, Serialize};

use crate::domain::MatchRef;

pub const LIVE_MATCHES_PATH: &str = "live_matches";
pub const PAST_MATCHES_PATH: &str = "past_matches";
pub const SCRAPE_COMMENTARY_PATH: &str = "scrape_commentary";
pub const FEEDBACK_PATH: &str = "feedback";
pub const HEALTH_PATH: &str = "health";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeCommentaryRequest {
    pub url: MatchRef,
}

/// Every field is optional; the collaborator drops what it could not produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeCommentaryResponse {
    /// Older backends send `commentary` when the page had nothing to scrape.
    #[serde(default, alias = "commentary")]
    pub raw_commentary: Option<String>,
    #[serde(default)]
    pub processed_commentary: Option<String>,
    /// Relative to the collaborator base address.
    #[serde(default)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub commentary_text: String,
    pub score: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyHealth {
    #[serde(default)]
    pub webdriver: String,
    #[serde(default)]
    pub llm_model: String,
    #[serde(default)]
    pub tts_model: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub dependencies: DependencyHealth,
}
