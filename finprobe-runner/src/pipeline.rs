//! Collection pipeline for one ticker.
//!
//! Failure policy per data kind:
//! 1. Prices: fallback chain over the configured providers; all failing is terminal
//! 2. Fundamentals: single provider; any failure is terminal
//! 3. Macro: fail-safe; an unavailable series is kept and the run continues
//! 4. News: empty without a usable key; an API failure is terminal
//!
//! Every news document is then classified. Nothing is written to disk apart
//! from creating the memory directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use finprobe_core::classify::{classify, ClassificationResult};
use finprobe_core::data::{
    AllSourcesFailed, AlphaVantageProvider, DataError, FredProvider, FundamentalsProvider,
    MacroProvider, MappingTable, NewsApiProvider, NewsError, NewsProvider, PriceChain,
    PriceProvider, ProviderId, SchemaError, StooqProvider, YahooProvider,
};
use finprobe_core::domain::{Financials, MacroSeries, PriceSeries};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, ConfigError};

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("provider setup failed: {0}")]
    Setup(#[source] DataError),

    #[error("price chain misconfigured: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Prices(#[from] AllSourcesFailed),

    #[error("fundamentals unavailable for {symbol}: {source}")]
    Fundamentals {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error(transparent)]
    News(#[from] NewsError),

    #[error("failed to create memory directory {path}: {source}")]
    MemoryDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which source served each data kind in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceTracker {
    pub prices: Option<ProviderId>,
    pub financials: Option<ProviderId>,
    /// Set only when the macro series was actually served.
    pub macro_series: Option<ProviderId>,
    /// Set only when at least one article came back.
    pub news: Option<ProviderId>,
    /// Whether an LLM key is configured.
    pub llm: bool,
}

/// Everything collected in one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ticker: String,
    pub started_at: DateTime<Utc>,
    pub prices: PriceSeries,
    pub financials: Financials,
    pub macro_series: MacroSeries,
    pub news: Vec<ClassificationResult>,
    pub sources: SourceTracker,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The four data sources a run draws from.
pub struct Pipeline {
    prices: PriceChain,
    fundamentals: Box<dyn FundamentalsProvider>,
    macro_source: Box<dyn MacroProvider>,
    news: Box<dyn NewsProvider>,
}

impl Pipeline {
    pub fn new(
        prices: PriceChain,
        fundamentals: Box<dyn FundamentalsProvider>,
        macro_source: Box<dyn MacroProvider>,
        news: Box<dyn NewsProvider>,
    ) -> Self {
        Self {
            prices,
            fundamentals,
            macro_source,
            news,
        }
    }

    /// Build the live providers from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let timeout = config.run.http_timeout();
        let creds = &config.credentials;

        let prices = build_price_chain(config)?;
        let fundamentals =
            AlphaVantageProvider::with_timeout(creds.alphavantage_key.clone(), timeout)
                .map_err(PipelineError::Setup)?;
        let macro_source = FredProvider::with_timeout(creds.fred_key.clone(), timeout)
            .map_err(PipelineError::Setup)?;
        let news = NewsApiProvider::with_timeout(creds.news_key.clone(), timeout)
            .map_err(PipelineError::Setup)?
            .with_page_size(config.run.news_page_size);

        Ok(Self::new(
            prices,
            Box::new(fundamentals),
            Box::new(macro_source),
            Box::new(news),
        ))
    }

    /// Price provider order, for display.
    pub fn price_order(&self) -> Vec<ProviderId> {
        self.prices.order()
    }

    /// Collect prices, fundamentals, macro and news for the configured ticker.
    pub fn run(&self, config: &AppConfig) -> Result<RunReport, PipelineError> {
        let settings = &config.run;
        let ticker = settings.ticker.as_str();
        let lookback = settings.lookback().map_err(ConfigError::from)?;
        let interval = settings.interval().map_err(ConfigError::from)?;
        let started_at = Utc::now();

        prepare_memory_dir(&settings.memory_dir)?;

        let mut sources = SourceTracker {
            llm: config.credentials.has_llm_key(),
            ..SourceTracker::default()
        };

        let prices = self.prices.fetch(ticker, lookback, interval)?;
        sources.prices = Some(prices.source);

        let financials = self
            .fundamentals
            .annual_financials(ticker)
            .map_err(|source| PipelineError::Fundamentals {
                symbol: ticker.to_string(),
                source,
            })?;
        sources.financials = Some(financials.source);

        let macro_series = self
            .macro_source
            .series(&settings.macro_series, settings.macro_start);
        if macro_series.is_available() {
            sources.macro_series = Some(macro_series.source);
        }

        let documents = self.news.search(ticker)?;
        if !documents.is_empty() {
            sources.news = Some(self.news.id());
        }
        let news: Vec<ClassificationResult> = documents.into_iter().map(classify).collect();

        info!(
            ticker,
            prices = prices.len(),
            financials = financials.len(),
            macro_rows = macro_series.len(),
            news = news.len(),
            "collection complete"
        );

        Ok(RunReport {
            ticker: ticker.to_string(),
            started_at,
            prices,
            financials,
            macro_series,
            news,
            sources,
        })
    }
}

/// Build the price fallback chain in the configured provider order.
pub fn build_price_chain(config: &AppConfig) -> Result<PriceChain, PipelineError> {
    let timeout = config.run.http_timeout();
    let mut providers: Vec<Box<dyn PriceProvider>> = Vec::new();

    for id in config.run.price_provider_ids()? {
        let provider: Box<dyn PriceProvider> = match id {
            ProviderId::Yahoo => {
                Box::new(YahooProvider::with_timeout(timeout).map_err(PipelineError::Setup)?)
            }
            ProviderId::AlphaVantage => Box::new(
                AlphaVantageProvider::with_timeout(
                    config.credentials.alphavantage_key.clone(),
                    timeout,
                )
                .map_err(PipelineError::Setup)?,
            ),
            ProviderId::Stooq => {
                Box::new(StooqProvider::with_timeout(timeout).map_err(PipelineError::Setup)?)
            }
            other => {
                return Err(
                    ConfigError::Invalid(format!("{other} is not a price provider")).into(),
                )
            }
        };
        providers.push(provider);
    }

    Ok(PriceChain::new(providers, MappingTable::default())?)
}

/// Create the memory directory if needed.
pub fn prepare_memory_dir(path: &Path) -> Result<PathBuf, PipelineError> {
    std::fs::create_dir_all(path).map_err(|source| PipelineError::MemoryDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, RunSettings};

    fn config(providers: &[&str]) -> AppConfig {
        AppConfig {
            credentials: Credentials::default(),
            llm_model: "gpt-4o-mini".into(),
            run: RunSettings {
                price_providers: providers.iter().map(|p| p.to_string()).collect(),
                ..RunSettings::default()
            },
        }
    }

    #[test]
    fn chain_follows_configured_order() {
        let chain = build_price_chain(&config(&["stooq", "yfinance"])).unwrap();
        assert_eq!(chain.order(), vec![ProviderId::Stooq, ProviderId::Yahoo]);
    }

    #[test]
    fn non_price_provider_is_a_config_error() {
        assert!(matches!(
            build_price_chain(&config(&["newsapi"])),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn news_errors_are_prefixed_once() {
        let err = PipelineError::from(NewsError::Api {
            status: 401,
            body: "apiKeyInvalid".into(),
        });
        assert_eq!(err.to_string(), "news search failed: HTTP 401: apiKeyInvalid");

        let err = PipelineError::from(NewsError::from(DataError::NetworkUnreachable(
            "connection refused".into(),
        )));
        assert_eq!(err.to_string().matches("news search failed").count(), 1);
    }

    #[test]
    fn live_pipeline_builds_without_keys() {
        let pipeline =
            Pipeline::from_config(&config(&["yahoo", "alpha_vantage", "stooq"])).unwrap();
        assert_eq!(
            pipeline.price_order(),
            vec![ProviderId::Yahoo, ProviderId::AlphaVantage, ProviderId::Stooq]
        );
    }

    #[test]
    fn memory_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("nested");
        prepare_memory_dir(&path).unwrap();
        assert!(path.is_dir());
        // Idempotent
        prepare_memory_dir(&path).unwrap();
    }
}
