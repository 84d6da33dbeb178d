//! Application configuration.
//!
//! Credentials come from the environment (a `.env` file is loaded first).
//! Run settings have defaults and may be overridden by a TOML file:
//!
//! ```toml
//! ticker = "MSFT"
//! period = "6mo"
//! price_providers = ["stooq", "yahoo"]
//! news_page_size = 5
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use finprobe_core::data::{Interval, Lookback, ParseError, ProviderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ALPHAVANTAGE_KEY_VAR: &str = "ALPHAVANTAGE_KEY";
pub const FRED_KEY_VAR: &str = "FREDAPI_KEY";
pub const NEWS_KEY_VAR: &str = "NEWSAPI_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const LLM_MODEL_VAR: &str = "LLM_MODEL";

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Upper bound NewsAPI accepts for `pageSize`.
pub const MAX_NEWS_PAGE_SIZE: u32 = 100;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// API keys. Never printed; `Debug` shows presence only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub alphavantage_key: Option<String>,
    pub fred_key: Option<String>,
    pub news_key: Option<String>,
    pub openai_key: Option<String>,
}

impl Credentials {
    /// Read keys through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            alphavantage_key: get(ALPHAVANTAGE_KEY_VAR),
            fred_key: get(FRED_KEY_VAR),
            news_key: get(NEWS_KEY_VAR),
            openai_key: get(OPENAI_KEY_VAR),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `(variable, present)` for every key, in display order.
    pub fn presence(&self) -> [(&'static str, bool); 4] {
        [
            (ALPHAVANTAGE_KEY_VAR, self.alphavantage_key.is_some()),
            (FRED_KEY_VAR, self.fred_key.is_some()),
            (NEWS_KEY_VAR, self.news_key.is_some()),
            (OPENAI_KEY_VAR, self.openai_key.is_some()),
        ]
    }

    pub fn has_llm_key(&self) -> bool {
        self.openai_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Credentials");
        for (name, present) in self.presence() {
            s.field(name, &if present { "<set>" } else { "<unset>" });
        }
        s.finish()
    }
}

/// Settings for one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    pub ticker: String,
    /// Lookback label, e.g. `1y`.
    pub period: String,
    /// Bar interval label, e.g. `1d`.
    pub interval: String,
    /// Price providers in fallback order.
    pub price_providers: Vec<String>,
    pub macro_series: String,
    pub macro_start: NaiveDate,
    pub news_page_size: u32,
    pub memory_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            ticker: "AAPL".into(),
            period: Lookback::OneYear.as_str().into(),
            interval: Interval::Daily.as_str().into(),
            price_providers: [ProviderId::Yahoo, ProviderId::AlphaVantage, ProviderId::Stooq]
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
            macro_series: "CPIAUCSL".into(),
            macro_start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN),
            news_page_size: 8,
            memory_dir: PathBuf::from("memory"),
            http_timeout_secs: 30,
        }
    }
}

impl RunSettings {
    /// Parse settings from a TOML string. Missing fields keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn lookback(&self) -> Result<Lookback, ParseError> {
        self.period.parse()
    }

    pub fn interval(&self) -> Result<Interval, ParseError> {
        self.interval.parse()
    }

    /// Configured price providers, parsed and checked to be price sources.
    pub fn price_provider_ids(&self) -> Result<Vec<ProviderId>, ConfigError> {
        let mut ids = Vec::with_capacity(self.price_providers.len());
        for name in &self.price_providers {
            let id: ProviderId = name.parse()?;
            if !matches!(
                id,
                ProviderId::Yahoo | ProviderId::AlphaVantage | ProviderId::Stooq
            ) {
                return Err(ConfigError::Invalid(format!("{id} is not a price provider")));
            }
            if ids.contains(&id) {
                return Err(ConfigError::Invalid(format!(
                    "price provider {id} listed twice"
                )));
            }
            ids.push(id);
        }
        if ids.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one price provider is required".into(),
            ));
        }
        Ok(ids)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid("ticker must not be empty".into()));
        }
        self.lookback()?;
        self.interval()?;
        self.price_provider_ids()?;
        if self.macro_series.trim().is_empty() {
            return Err(ConfigError::Invalid("macro_series must not be empty".into()));
        }
        if !(1..=MAX_NEWS_PAGE_SIZE).contains(&self.news_page_size) {
            return Err(ConfigError::Invalid(format!(
                "news_page_size must be between 1 and {MAX_NEWS_PAGE_SIZE}, got {}",
                self.news_page_size
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub llm_model: String,
    pub run: RunSettings,
}

impl AppConfig {
    /// Load `.env`, read the environment, then apply the optional TOML file.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        dotenvy::dotenv().ok();
        Self::from_parts(|name| std::env::var(name).ok(), config_path)
    }

    /// Same as [`AppConfig::load`] but with an explicit variable lookup and
    /// without touching `.env`.
    pub fn from_parts(
        lookup: impl Fn(&str) -> Option<String>,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let run = match config_path {
            Some(path) => RunSettings::from_file(path)?,
            None => RunSettings::default(),
        };
        let llm_model = lookup(LLM_MODEL_VAR)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
        let config = Self {
            credentials: Credentials::from_lookup(lookup),
            llm_model,
            run,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()
    }

    /// Override the ticker, e.g. from the command line.
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Result<Self, ConfigError> {
        self.run.ticker = ticker.into();
        self.validate()?;
        Ok(self)
    }
}
