//! Lexicon-based sentiment scoring.
//!
//! Text is lower-cased and split on every run of characters outside
//! `[a-zA-Z]`. Each token found in [`POSITIVE_WORDS`] adds one to `pos`, each
//! token found in [`NEGATIVE_WORDS`] adds one to `neg`, and the score is
//! `pos - neg`. Repeated tokens count every time.

use crate::models::{AggregateSentiment, SentimentLabel, SentimentResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Words that push a headline towards "positive".
///
/// `cease-fire` can never match because the tokenizer splits on `-`; it is
/// kept so the list reads like the source vocabulary.
pub static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "win", "wins", "won", "success", "secure", "growth", "improve", "improved", "improves",
        "record", "milestone", "peace", "ceasefire", "cease-fire", "joins", "member", "elected",
        "agreed", "agreement", "rescued", "saves", "saved", "approval", "approves", "deal", "aid",
        "relief", "support", "recovery",
    ]
    .into_iter()
    .collect()
});

/// Words that push a headline towards "negative".
pub static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "kill", "killed", "dead", "deaths", "dies", "death", "massacre", "massacres", "storm",
        "hurricane", "flood", "landslide", "stampede", "riot", "riots", "protests", "protest",
        "war", "conflict", "airstrike", "attack", "attacks", "crash", "crashes", "injured",
        "injures", "injury", "arrest", "arrested", "fire", "fires", "explosion", "explosions",
        "collapse", "crimes", "crime", "charged", "sentence", "sentences", "curfew",
    ]
    .into_iter()
    .collect()
});

static NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z]+").unwrap());

/// Score a single text.
///
/// Empty input yields the neutral zero result.
///
/// # Examples
///
/// ```ignore
/// let r = score("win win kill");
/// assert_eq!((r.pos, r.neg, r.score), (2, 1, 1));
/// ```
pub fn score(text: &str) -> SentimentResult {
    let lowered = text.to_lowercase();
    let mut pos = 0u32;
    let mut neg = 0u32;

    for token in NON_ALPHA.split(&lowered).filter(|t| !t.is_empty()) {
        if POSITIVE_WORDS.contains(token) {
            pos += 1;
        }
        if NEGATIVE_WORDS.contains(token) {
            neg += 1;
        }
    }

    let score = i64::from(pos) - i64::from(neg);
    SentimentResult {
        score,
        label: SentimentLabel::from_score(score),
        pos,
        neg,
    }
}

/// [`score`] for callers holding an optional text; `None` scores as empty.
pub fn score_opt(text: Option<&str>) -> SentimentResult {
    score(text.unwrap_or_default())
}

/// Sum the scores of a batch of texts and label the total.
pub fn analyze<S: AsRef<str>>(texts: &[S]) -> AggregateSentiment {
    let mut total_pos = 0u64;
    let mut total_neg = 0u64;
    let mut sum = 0i64;

    for text in texts {
        let result = score(text.as_ref());
        total_pos += u64::from(result.pos);
        total_neg += u64::from(result.neg);
        sum += result.score;
    }

    debug!(
        texts = texts.len(),
        pos = total_pos,
        neg = total_neg,
        score = sum,
        "Analyzed sentiment batch"
    );

    AggregateSentiment {
        score: sum,
        label: SentimentLabel::from_score(sum),
    }
}
