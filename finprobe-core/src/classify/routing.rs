//! Rule-based document routing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Checked first, so earnings-flavoured macro text routes to earnings.
pub const EARNINGS_TERMS: [&str; 4] = ["eps", "guidance", "revenue", "earnings"];
pub const MACRO_TERMS: [&str; 5] = ["inflation", "rates", "pmi", "jobless", "cpi"];

pub const EARNINGS_REASON: &str = "matched: earnings keyword";
pub const MACRO_REASON: &str = "matched: macro keyword";
pub const DEFAULT_REASON: &str = "default: general news";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Earnings,
    Macro,
    News,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Earnings => "earnings",
            Route::Macro => "macro",
            Route::News => "news",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route a document on its title and content. Returns the route and the
/// reason string of the rule that fired.
pub fn route(title: &str, content: &str) -> (Route, &'static str) {
    let text = format!("{title} {content}").to_lowercase();
    if EARNINGS_TERMS.iter().any(|k| text.contains(k)) {
        (Route::Earnings, EARNINGS_REASON)
    } else if MACRO_TERMS.iter().any(|k| text.contains(k)) {
        (Route::Macro, MACRO_REASON)
    } else {
        (Route::News, DEFAULT_REASON)
    }
}
