//! Data models for portal events, sentiment results and the upstream payload.
//!
//! This module defines the structures shared by the scrapers, the HTTP layer
//! and the command-line front end:
//! - [`EventItem`] / [`EventsResponse`]: extracted portal entries and the
//!   JSON body returned for a single portal page
//! - [`SentimentResult`] / [`AggregateSentiment`]: output of the lexicon scorer
//! - [`ParseResponse`]: the slice of the MediaWiki `action=parse` payload we read

use serde::{Deserialize, Serialize};

/// Sign-based classification of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Derive the label from the sign of a score.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// assert_eq!(SentimentLabel::from_score(2), SentimentLabel::Positive);
    /// assert_eq!(SentimentLabel::from_score(0), SentimentLabel::Neutral);
    /// ```
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// Score of a single text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// `pos - neg`.
    pub score: i64,
    /// Derived from the sign of `score`.
    pub label: SentimentLabel,
    /// Number of tokens found in the positive lexicon.
    pub pos: u32,
    /// Number of tokens found in the negative lexicon.
    pub neg: u32,
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self {
            score: 0,
            label: SentimentLabel::Neutral,
            pos: 0,
            neg: 0,
        }
    }
}

/// Summed score over a batch of texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSentiment {
    pub score: i64,
    pub label: SentimentLabel,
}

/// A single top-level entry of a current events portal page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventItem {
    /// Text of the first article link, or the first sentence of the entry.
    pub title: String,
    /// At most 300 characters of the whitespace-collapsed entry text.
    pub summary: String,
    /// Absolute URL of the first article link, or of the portal page itself.
    pub url: String,
    /// The requested date, or today's date as `YYYY-MM-DD`.
    pub date: String,
}

/// JSON body of the events endpoint and of `events` command output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResponse {
    /// The date exactly as requested, `null` when none was given.
    pub date: Option<String>,
    /// Portal page title, e.g. `Portal:Current_events/2024_March_5`.
    pub page: String,
    /// Always equal to `items.len()`.
    pub count: usize,
    pub items: Vec<EventItem>,
}

impl EventsResponse {
    pub fn new(date: Option<String>, page: String, items: Vec<EventItem>) -> Self {
        Self {
            date,
            page,
            count: items.len(),
            items,
        }
    }
}

/// Upstream `action=parse&formatversion=2` payload.
///
/// Both levels are optional so a page that does not exist (or an error body
/// without `parse`) degrades to empty HTML instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct ParseResponse {
    pub parse: Option<ParsedPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParsedPage {
    pub text: Option<String>,
}

impl ParseResponse {
    /// Rendered HTML of the page, empty when the field is missing.
    pub fn into_html(self) -> String {
        self.parse.and_then(|p| p.text).unwrap_or_default()
    }
}
