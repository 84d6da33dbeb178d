//! Alpha Vantage provider: daily prices and annual income statements.
//!
//! Prices use the free `TIME_SERIES_DAILY` endpoint in `compact` mode (about
//! 100 rows), so the requested lookback and interval are not honoured here.
//! Alpha Vantage reports errors, rate-limit notes and premium-only notices in
//! a 200 response body, so every payload is checked for those keys first.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, check_status, transport_error, DEFAULT_TIMEOUT};
use super::provider::{
    DataError, FundamentalsProvider, Interval, Lookback, PriceProvider, ProviderId, RawPriceTable,
};
use super::schema::raw_frame;
use crate::domain::{Financials, IncomeReport};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Keys Alpha Vantage uses to report a problem inside a successful response.
#[derive(Debug, Default, Deserialize)]
struct ApiNotices {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ApiNotices {
    fn into_error(self) -> Option<DataError> {
        if let Some(msg) = self.error_message {
            return Some(DataError::ProviderMessage(msg));
        }
        if let Some(note) = self.note {
            return Some(DataError::RateLimited(note));
        }
        self.information.map(DataError::ProviderMessage)
    }
}

/// TIME_SERIES_DAILY response
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyQuote>>,
    #[serde(flatten)]
    notices: ApiNotices,
}

#[derive(Debug, Deserialize)]
struct DailyQuote {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

/// INCOME_STATEMENT response
#[derive(Debug, Deserialize)]
struct IncomeStatementResponse {
    #[serde(rename = "annualReports")]
    annual_reports: Option<Vec<AnnualReport>>,
    #[serde(flatten)]
    notices: ApiNotices,
}

#[derive(Debug, Deserialize)]
struct AnnualReport {
    #[serde(rename = "fiscalDateEnding")]
    fiscal_date_ending: String,
    #[serde(rename = "totalRevenue")]
    total_revenue: String,
    #[serde(rename = "grossProfit")]
    gross_profit: String,
}

/// Alpha Vantage client.
pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: Option<String>) -> Result<Self, DataError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: Option<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, DataError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DataError::AuthenticationRequired("ALPHAVANTAGE_KEY is not set".into()))
    }

    fn query<T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
        symbol: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, DataError> {
        let key = self.key()?;
        debug!(function, symbol, "alpha vantage request");

        let mut params = vec![("function", function), ("symbol", symbol), ("apikey", key)];
        params.extend_from_slice(extra);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .map_err(transport_error)?;
        let resp = check_status(resp, symbol)?;

        resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!(
                "failed to parse {function} for {symbol}: {e}"
            ))
        })
    }

    fn parse_daily(symbol: &str, resp: TimeSeriesResponse) -> Result<RawPriceTable, DataError> {
        if let Some(err) = resp.notices.into_error() {
            return Err(err);
        }
        let series = resp.time_series.ok_or_else(|| {
            DataError::ResponseFormatChanged("missing 'Time Series (Daily)'".into())
        })?;
        if series.is_empty() {
            return Err(DataError::EmptyResult {
                symbol: symbol.to_string(),
            });
        }

        let mut dates = Vec::with_capacity(series.len());
        let mut opens = Vec::with_capacity(series.len());
        let mut highs = Vec::with_capacity(series.len());
        let mut lows = Vec::with_capacity(series.len());
        let mut closes = Vec::with_capacity(series.len());

        for (day, quote) in &series {
            dates.push(parse_date(day)?);
            opens.push(Some(parse_number("1. open", &quote.open)?));
            highs.push(Some(parse_number("2. high", &quote.high)?));
            lows.push(Some(parse_number("3. low", &quote.low)?));
            closes.push(Some(parse_number("4. close", &quote.close)?));
        }

        Ok(RawPriceTable {
            symbol: symbol.to_string(),
            provider: ProviderId::AlphaVantage,
            frame: raw_frame(
                &dates,
                vec![
                    ("1. open", opens),
                    ("2. high", highs),
                    ("3. low", lows),
                    ("4. close", closes),
                ],
            )?,
        })
    }

    fn parse_income_statement(
        symbol: &str,
        resp: IncomeStatementResponse,
    ) -> Result<Financials, DataError> {
        if let Some(err) = resp.notices.into_error() {
            return Err(err);
        }
        let reports = resp
            .annual_reports
            .ok_or_else(|| DataError::ResponseFormatChanged("missing 'annualReports'".into()))?;
        if reports.is_empty() {
            return Err(DataError::EmptyResult {
                symbol: symbol.to_string(),
            });
        }

        let parsed = reports
            .iter()
            .take(crate::domain::fundamentals::MAX_PERIODS)
            .map(|r| {
                Ok(IncomeReport {
                    fiscal_date_ending: parse_date(&r.fiscal_date_ending)?,
                    total_revenue: parse_number("totalRevenue", &r.total_revenue)?,
                    gross_profit: parse_number("grossProfit", &r.gross_profit)?,
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        Ok(Financials::from_reports(
            symbol,
            ProviderId::AlphaVantage,
            parsed,
        ))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DataError::ResponseFormatChanged(format!("bad date '{s}': {e}")))
}

fn parse_number(field: &str, s: &str) -> Result<f64, DataError> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("non-numeric {field}: '{s}'")))
}

impl PriceProvider for AlphaVantageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    fn fetch_raw(
        &self,
        symbol: &str,
        _lookback: Lookback,
        _interval: Interval,
    ) -> Result<RawPriceTable, DataError> {
        let resp: TimeSeriesResponse =
            self.query("TIME_SERIES_DAILY", symbol, &[("outputsize", "compact")])?;
        Self::parse_daily(symbol, resp)
    }
}

impl FundamentalsProvider for AlphaVantageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    fn annual_financials(&self, symbol: &str) -> Result<Financials, DataError> {
        let resp: IncomeStatementResponse = self.query("INCOME_STATEMENT", symbol, &[])?;
        Self::parse_income_statement(symbol, resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "Meta Data": { "1. Information": "Daily Prices", "2. Symbol": "AAPL" },
        "Time Series (Daily)": {
            "2024-01-03": { "1. open": "184.22", "2. high": "185.88", "3. low": "183.43", "4. close": "184.25", "5. volume": "58414460" },
            "2024-01-02": { "1. open": "187.15", "2. high": "188.44", "3. low": "183.885", "4. close": "185.64", "5. volume": "82488674" }
        }
    }"#;

    const INCOME: &str = r#"{
        "symbol": "AAPL",
        "annualReports": [
            { "fiscalDateEnding": "2024-09-30", "totalRevenue": "391035000000", "grossProfit": "180683000000" },
            { "fiscalDateEnding": "2023-09-30", "totalRevenue": "383285000000", "grossProfit": "169148000000" },
            { "fiscalDateEnding": "2022-09-30", "totalRevenue": "394328000000", "grossProfit": "170782000000" },
            { "fiscalDateEnding": "2021-09-30", "totalRevenue": "365817000000", "grossProfit": "152836000000" },
            { "fiscalDateEnding": "2020-09-30", "totalRevenue": "274515000000", "grossProfit": "104956000000" }
        ],
        "quarterlyReports": []
    }"#;

    #[test]
    fn parses_daily_series_under_native_names() {
        let resp: TimeSeriesResponse = serde_json::from_str(DAILY).unwrap();
        let raw = AlphaVantageProvider::parse_daily("AAPL", resp).unwrap();
        assert_eq!(raw.frame.height(), 2);
        assert!(raw.frame.column("4. close").is_ok());
        assert!(raw.frame.column("Close").is_err());
    }

    #[test]
    fn rate_limit_note_is_an_error() {
        let resp: TimeSeriesResponse = serde_json::from_str(
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
        )
        .unwrap();
        assert!(matches!(
            AlphaVantageProvider::parse_daily("AAPL", resp),
            Err(DataError::RateLimited(_))
        ));
    }

    #[test]
    fn error_message_is_an_error() {
        let resp: TimeSeriesResponse = serde_json::from_str(
            r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#,
        )
        .unwrap();
        assert!(matches!(
            AlphaVantageProvider::parse_daily("AAPL", resp),
            Err(DataError::ProviderMessage(_))
        ));
    }

    #[test]
    fn income_statement_keeps_four_periods() {
        let resp: IncomeStatementResponse = serde_json::from_str(INCOME).unwrap();
        let f = AlphaVantageProvider::parse_income_statement("AAPL", resp).unwrap();
        assert_eq!(f.len(), 4);
        assert!((f.periods[0].revenue_bil - 391.035).abs() < 1e-9);
        assert!(f.periods[0].ttm_margin.is_none());
        assert!(f.periods[1].ttm_margin.is_some());
    }

    #[test]
    fn income_statement_rejects_none_values() {
        let resp: IncomeStatementResponse = serde_json::from_str(
            r#"{"annualReports":[{"fiscalDateEnding":"2024-09-30","totalRevenue":"None","grossProfit":"1"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            AlphaVantageProvider::parse_income_statement("AAPL", resp),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let p = AlphaVantageProvider::new(None)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(matches!(
            p.fetch_raw("AAPL", Lookback::OneYear, Interval::Daily),
            Err(DataError::AuthenticationRequired(_))
        ));
        assert!(matches!(
            p.annual_financials("AAPL"),
            Err(DataError::AuthenticationRequired(_))
        ));
    }
}
