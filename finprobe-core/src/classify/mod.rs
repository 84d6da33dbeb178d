//! Keyword document classifier: a route label and a sentiment label.
//!
//! Pure functions over fixed keyword sets. Nothing here is configurable at
//! runtime and nothing touches the network.

pub mod routing;
pub mod sentiment;

use serde::{Deserialize, Serialize};

use crate::domain::NewsDocument;

pub use routing::{route, Route};
pub use sentiment::{sentiment, Sentiment};

/// A document with its route, sentiment, and the routing rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub document: NewsDocument,
    pub route: Route,
    pub sentiment: Sentiment,
    pub reason: String,
}

/// Route on title + content, sentiment on content alone.
pub fn classify(document: NewsDocument) -> ClassificationResult {
    let (route, reason) = route(&document.title, &document.content);
    let sentiment = sentiment(&document.content);
    ClassificationResult {
        document,
        route,
        sentiment,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_ignores_title() {
        let doc = NewsDocument::new("Strong profit growth", "Shares were flat", "", "Wire");
        let result = classify(doc);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.route, Route::News);
    }

    #[test]
    fn keeps_the_document() {
        let doc = NewsDocument::new(
            "Revenue miss",
            "Sales decline",
            "2024-05-03T12:00:00Z",
            "Wire",
        );
        let result = classify(doc.clone());
        assert_eq!(result.document, doc);
        assert_eq!(result.route, Route::Earnings);
        assert_eq!(result.sentiment, Sentiment::Bear);
        assert_eq!(result.reason, "matched: earnings keyword");
    }
}
