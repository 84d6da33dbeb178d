//! Yahoo Finance price provider.
//!
//! Fetches bars from Yahoo's v8 chart API and exposes them under
//! yfinance-style column names (`Close`, `Adj Close`). The adjusted column is
//! only present when Yahoo returns it, which is what lets the mapping table
//! fall back to `Close`.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, check_status, transport_error, DEFAULT_TIMEOUT};
use super::provider::{DataError, Interval, Lookback, PriceProvider, ProviderId, RawPriceTable};
use super::schema::raw_frame;

const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the chart API URL for a symbol, range and interval.
    fn chart_url(&self, symbol: &str, lookback: Lookback, interval: Interval) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range={lookback}&interval={interval}&includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Parse the chart API response into a raw table.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<RawPriceTable, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ProviderMessage(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data.timestamp.ok_or_else(|| DataError::EmptyResult {
            symbol: symbol.to_string(),
        })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let n = timestamps.len();
        let mut dates = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut adjusted = Vec::with_capacity(n);

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let close = quote.close.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            // Skip rows with no prices at all (holidays/non-trading days)
            if close.is_none() && adj_close.is_none() {
                continue;
            }

            dates.push(date);
            closes.push(close);
            adjusted.push(adj_close);
        }

        if dates.is_empty() {
            return Err(DataError::EmptyResult {
                symbol: symbol.to_string(),
            });
        }

        let mut columns = vec![("Close", closes)];
        if adj_closes.is_some() {
            columns.push(("Adj Close", adjusted));
        }

        Ok(RawPriceTable {
            symbol: symbol.to_string(),
            provider: ProviderId::Yahoo,
            frame: raw_frame(&dates, columns)?,
        })
    }
}

impl PriceProvider for YahooProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_raw(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<RawPriceTable, DataError> {
        let url = self.chart_url(symbol, lookback, interval);
        debug!(%url, "yahoo chart request");

        let resp = self.client.get(&url).send().map_err(transport_error)?;
        let resp = check_status(resp, symbol)?;

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}
