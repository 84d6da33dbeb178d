//! Provider traits, request parameters, and structured error types.
//!
//! One trait per data kind. Prices are the only kind with more than one
//! implementation in play at a time; the others exist so the pipeline can be
//! driven by fakes in tests.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use polars::prelude::{DataFrame, PolarsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Financials, MacroSeries, NewsDocument};

/// Identifies an external data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    AlphaVantage,
    Stooq,
    Fred,
    NewsApi,
}

impl ProviderId {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::Yahoo => "yahoo",
            ProviderId::AlphaVantage => "alpha_vantage",
            ProviderId::Stooq => "stooq",
            ProviderId::Fred => "fred",
            ProviderId::NewsApi => "newsapi",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" | "yfinance" => Ok(ProviderId::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(ProviderId::AlphaVantage),
            "stooq" => Ok(ProviderId::Stooq),
            "fred" => Ok(ProviderId::Fred),
            "newsapi" => Ok(ProviderId::NewsApi),
            other => Err(ParseError::UnknownProvider(other.to_string())),
        }
    }
}

/// How far back a price request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookback {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Lookback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookback::OneMonth => "1mo",
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
            Lookback::TenYears => "10y",
            Lookback::YearToDate => "ytd",
            Lookback::Max => "max",
        }
    }

    /// First date covered when looking back from `today`. `None` means unbounded.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            Lookback::OneMonth => 1,
            Lookback::ThreeMonths => 3,
            Lookback::SixMonths => 6,
            Lookback::OneYear => 12,
            Lookback::TwoYears => 24,
            Lookback::FiveYears => 60,
            Lookback::TenYears => 120,
            Lookback::YearToDate => return NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Lookback::Max => return None,
        };
        today.checked_sub_months(Months::new(months))
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1mo" => Ok(Lookback::OneMonth),
            "3mo" => Ok(Lookback::ThreeMonths),
            "6mo" => Ok(Lookback::SixMonths),
            "1y" => Ok(Lookback::OneYear),
            "2y" => Ok(Lookback::TwoYears),
            "5y" => Ok(Lookback::FiveYears),
            "10y" => Ok(Lookback::TenYears),
            "ytd" => Ok(Lookback::YearToDate),
            "max" => Ok(Lookback::Max),
            other => Err(ParseError::UnknownLookback(other.to_string())),
        }
    }
}

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(Interval::Daily),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            other => Err(ParseError::UnknownInterval(other.to_string())),
        }
    }
}

/// Errors from parsing request parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown lookback period '{0}' (expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
    UnknownLookback(String),

    #[error("unknown interval '{0}' (expected one of 1d, 1wk, 1mo)")]
    UnknownInterval(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}

/// Structured error types for a single provider call.
///
/// These are displayable in both the run report and log lines.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("provider reported an error: {0}")]
    ProviderMessage(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no price column found in {provider} response (columns: {available:?})")]
    MissingPriceColumn {
        provider: ProviderId,
        available: Vec<String>,
    },

    #[error("empty result for {symbol}")]
    EmptyResult { symbol: String },

    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

/// Provider output before normalization: a `date` column plus whatever
/// columns the provider natively names.
#[derive(Debug, Clone)]
pub struct RawPriceTable {
    pub symbol: String,
    pub provider: ProviderId,
    pub frame: DataFrame,
}

/// A source of daily/weekly/monthly closing prices.
///
/// Implementations only fetch; mapping provider columns onto the canonical
/// schema is the chain's job.
pub trait PriceProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn fetch_raw(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<RawPriceTable, DataError>;
}

/// Annual income-statement fundamentals.
pub trait FundamentalsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn annual_financials(&self, symbol: &str) -> Result<Financials, DataError>;
}

/// Macroeconomic indicator series.
///
/// Infallible by contract: failures come back as an empty, unavailable series.
pub trait MacroProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn series(&self, series_id: &str, start: NaiveDate) -> MacroSeries;
}

/// Errors from a news search.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("news search failed: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("news search failed: {0}")]
    Data(#[from] DataError),
}

/// News search.
pub trait NewsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Search for recent articles. An unconfigured credential yields `Ok(vec![])`.
    fn search(&self, query: &str) -> Result<Vec<NewsDocument>, NewsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_round_trips_through_str() {
        for s in ["1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"] {
            let lb: Lookback = s.parse().unwrap();
            assert_eq!(lb.as_str(), s);
        }
        assert_eq!(
            "2w".parse::<Lookback>(),
            Err(ParseError::UnknownLookback("2w".into()))
        );
    }

    #[test]
    fn lookback_start_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            Lookback::OneMonth.start_date(today),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            Lookback::OneYear.start_date(today),
            NaiveDate::from_ymd_opt(2023, 3, 31)
        );
        assert_eq!(
            Lookback::YearToDate.start_date(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(Lookback::Max.start_date(today), None);
    }

    #[test]
    fn interval_parses() {
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Weekly);
        assert!("5m".parse::<Interval>().is_err());
    }

    #[test]
    fn provider_names_parse_back() {
        for id in [
            ProviderId::Yahoo,
            ProviderId::AlphaVantage,
            ProviderId::Stooq,
            ProviderId::Fred,
            ProviderId::NewsApi,
        ] {
            assert_eq!(id.name().parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!("YFinance".parse::<ProviderId>().unwrap(), ProviderId::Yahoo);
    }
}
