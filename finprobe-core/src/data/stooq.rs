//! Stooq price provider.
//!
//! Stooq serves plain CSV (`Date,Open,High,Low,Close,Volume`) without a key.
//! US tickers are addressed as `<ticker>.us`, with share-class dots written
//! as dashes (`BRK.B` → `brk-b.us`). An unknown symbol comes back as a 200
//! response whose body is `No data`.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, check_status, transport_error, DEFAULT_TIMEOUT};
use super::provider::{DataError, Interval, Lookback, PriceProvider, ProviderId, RawPriceTable};
use super::schema::raw_frame;

const BASE_URL: &str = "https://stooq.com";

/// Market suffixes Stooq accepts as-is.
const MARKET_SUFFIXES: [&str; 7] = ["us", "uk", "de", "jp", "hk", "pl", "hu"];

#[derive(Debug, Deserialize)]
struct StooqRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: Option<f64>,
}

/// Stooq daily CSV provider.
pub struct StooqProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl StooqProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `AAPL` → `aapl.us`, `BRK.B` → `brk-b.us`. Symbols ending in a known
    /// market suffix and `^` indices are only lowercased.
    fn stooq_symbol(symbol: &str) -> String {
        let lower = symbol.to_ascii_lowercase();
        if lower.starts_with('^') {
            return lower;
        }
        if let Some((_, suffix)) = lower.rsplit_once('.') {
            if MARKET_SUFFIXES.contains(&suffix) {
                return lower;
            }
        }
        format!("{}.us", lower.replace('.', "-"))
    }

    fn interval_code(interval: Interval) -> &'static str {
        match interval {
            Interval::Daily => "d",
            Interval::Weekly => "w",
            Interval::Monthly => "m",
        }
    }

    fn download_url(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
        today: NaiveDate,
    ) -> String {
        let mut url = format!(
            "{}/q/d/l/?s={}&i={}",
            self.base_url,
            Self::stooq_symbol(symbol),
            Self::interval_code(interval)
        );
        if let Some(start) = lookback.start_date(today) {
            url.push_str(&format!(
                "&d1={}&d2={}",
                start.format("%Y%m%d"),
                today.format("%Y%m%d")
            ));
        }
        url
    }

    fn parse_csv(symbol: &str, body: &str) -> Result<RawPriceTable, DataError> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("no data") {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut reader = csv::Reader::from_reader(trimmed.as_bytes());
        let mut dates = Vec::new();
        let mut closes = Vec::new();

        for row in reader.deserialize::<StooqRow>() {
            let row = row.map_err(|e| {
                DataError::ResponseFormatChanged(format!("bad Stooq CSV row for {symbol}: {e}"))
            })?;
            dates.push(row.date);
            closes.push(row.close);
        }

        if dates.is_empty() {
            return Err(DataError::EmptyResult {
                symbol: symbol.to_string(),
            });
        }

        Ok(RawPriceTable {
            symbol: symbol.to_string(),
            provider: ProviderId::Stooq,
            frame: raw_frame(&dates, vec![("Close", closes)])?,
        })
    }
}

impl PriceProvider for StooqProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Stooq
    }

    fn fetch_raw(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<RawPriceTable, DataError> {
        let url = self.download_url(symbol, lookback, interval, Local::now().date_naive());
        debug!(%url, "stooq download");

        let resp = self.client.get(&url).send().map_err(transport_error)?;
        let resp = check_status(resp, symbol)?;
        let body = resp.text().map_err(transport_error)?;

        Self::parse_csv(symbol, &body)
    }
}
