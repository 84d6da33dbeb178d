//! Keyword sentiment.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const POSITIVE_TERMS: [&str; 7] = [
    "growth", "beat", "gain", "strong", "up", "positive", "profit",
];
pub const NEGATIVE_TERMS: [&str; 7] = [
    "loss", "miss", "down", "decline", "negative", "weak", "drop",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bull,
    Bear,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bull => "bull",
            Sentiment::Bear => "bear",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of distinct terms from `terms` contained anywhere in `text`.
///
/// Containment, not whole-word: "upgrade" counts for "up".
fn count_terms(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| text.contains(*t)).count()
}

/// Bull if more positive terms than negative, bear if fewer, neutral on a tie.
pub fn sentiment(text: &str) -> Sentiment {
    let text = text.to_lowercase();
    let pos = count_terms(&text, &POSITIVE_TERMS);
    let neg = count_terms(&text, &NEGATIVE_TERMS);
    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => Sentiment::Bull,
        std::cmp::Ordering::Less => Sentiment::Bear,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_term_once() {
        assert_eq!(count_terms("gain gain gain", &POSITIVE_TERMS), 1);
    }

    #[test]
    fn containment_not_whole_word() {
        // "upgrade" contains "up"
        assert_eq!(sentiment("Analyst upgrade"), Sentiment::Bull);
        // "breakdown" contains "down"
        assert_eq!(sentiment("breakdown"), Sentiment::Bear);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(sentiment("STRONG PROFIT"), Sentiment::Bull);
    }

    #[test]
    fn tie_is_neutral() {
        assert_eq!(sentiment("strong quarter, weak guidance"), Sentiment::Neutral);
        assert_eq!(sentiment(""), Sentiment::Neutral);
    }
}
