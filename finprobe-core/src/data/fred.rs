//! FRED macroeconomic series provider.
//!
//! Fail-safe: every failure, including a malformed key, produces an empty
//! series marked unavailable. Nothing here returns an error to the caller.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use super::http::{build_client, check_status, transport_error, DEFAULT_TIMEOUT};
use super::provider::{DataError, MacroProvider, ProviderId};
use crate::domain::{MacroSeries, Observation};

const BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Length of a FRED API key.
pub const FRED_KEY_LEN: usize = 32;

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// FRED client.
pub struct FredProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl FredProvider {
    pub fn new(api_key: Option<String>) -> Result<Self, DataError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: Option<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// FRED keys are 32 lower-case alphanumeric characters.
    pub fn validate_key(key: Option<&str>) -> Result<&str, DataError> {
        let key = key.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
            DataError::AuthenticationRequired("FREDAPI_KEY is not set".into())
        })?;
        let well_formed = key.len() == FRED_KEY_LEN
            && key
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase());
        if !well_formed {
            return Err(DataError::AuthenticationRequired(format!(
                "FREDAPI_KEY must be {FRED_KEY_LEN} lower-case alphanumeric characters"
            )));
        }
        Ok(key)
    }

    fn try_series(&self, series_id: &str, start: NaiveDate) -> Result<Vec<Observation>, DataError> {
        let key = Self::validate_key(self.api_key.as_deref())?;
        let start = start.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get(format!("{}/series/observations", self.base_url))
            .query(&[
                ("series_id", series_id),
                ("api_key", key),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
            ])
            .send()
            .map_err(transport_error)?;
        let resp = check_status(resp, series_id)?;

        let body: ObservationsResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse FRED {series_id}: {e}"))
        })?;
        Self::parse_observations(body)
    }

    fn parse_observations(body: ObservationsResponse) -> Result<Vec<Observation>, DataError> {
        if let Some(msg) = body.error_message {
            return Err(DataError::ProviderMessage(msg));
        }

        let mut out = Vec::with_capacity(body.observations.len());
        for raw in body.observations {
            // "." marks a missing observation
            let Ok(value) = raw.value.trim().parse::<f64>() else {
                continue;
            };
            let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
                DataError::ResponseFormatChanged(format!("bad FRED date '{}': {e}", raw.date))
            })?;
            out.push(Observation { date, value });
        }
        Ok(out)
    }
}

impl MacroProvider for FredProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Fred
    }

    fn series(&self, series_id: &str, start: NaiveDate) -> MacroSeries {
        info!(series_id, %start, "fetching macro series");
        match self.try_series(series_id, start) {
            Ok(observations) => {
                info!(series_id, rows = observations.len(), "macro series fetched");
                MacroSeries::available(series_id, ProviderId::Fred, observations)
            }
            Err(error) => {
                warn!(series_id, %error, "macro series unavailable, continuing with empty series");
                MacroSeries::unavailable(series_id, ProviderId::Fred, error.to_string())
            }
        }
    }
}
