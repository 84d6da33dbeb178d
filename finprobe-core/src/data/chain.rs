//! Price fallback chain: tries price providers in order until one succeeds.
//!
//! Policy:
//! 1. Ask the next provider for its raw table
//! 2. Normalize it through the provider's column mapping
//! 3. First success is returned as-is; later providers are never called
//! 4. Any failure (transport, provider message, missing column, empty) is
//!    logged and recorded, and the next provider is tried
//! 5. When every provider has failed, all recorded failures are returned

use thiserror::Error;
use tracing::{info, warn};

use super::canonicalize::Canonicalizer;
use super::provider::{DataError, Interval, Lookback, PriceProvider, ProviderId};
use super::schema::{MappingTable, SchemaError};
use crate::domain::PriceSeries;

/// Why one provider in the chain did not produce a series.
#[derive(Debug)]
pub struct SourceFailure {
    pub source: ProviderId,
    pub error: DataError,
}

/// Terminal failure: no provider produced a series.
#[derive(Debug, Error)]
#[error("all price sources failed for {symbol} ({} tried)", .failures.len())]
pub struct AllSourcesFailed {
    pub symbol: String,
    pub failures: Vec<SourceFailure>,
}

impl AllSourcesFailed {
    /// One `source: reason` line per attempted provider.
    pub fn reasons(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.source, f.error))
            .collect()
    }
}

/// Ordered list of price providers plus the mapping table used to normalize
/// whatever the winning provider returns.
pub struct PriceChain {
    providers: Vec<Box<dyn PriceProvider>>,
    mappings: MappingTable,
}

impl PriceChain {
    /// Build a chain. Every provider must have a column mapping; this is
    /// checked here so a missing mapping fails at startup, not mid-run.
    pub fn new(
        providers: Vec<Box<dyn PriceProvider>>,
        mappings: MappingTable,
    ) -> Result<Self, SchemaError> {
        if providers.is_empty() {
            return Err(SchemaError::NoProviders);
        }
        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id()).collect();
        mappings.validate(&ids)?;
        Ok(Self {
            providers,
            mappings,
        })
    }

    /// Provider order as configured.
    pub fn order(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Fetch a normalized price series, first success wins.
    pub fn fetch(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<PriceSeries, AllSourcesFailed> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let source = provider.id();
            info!(symbol, %source, %lookback, %interval, "fetching prices");

            match self.try_provider(provider.as_ref(), symbol, lookback, interval) {
                Ok(series) => {
                    info!(symbol, %source, rows = series.len(), "prices fetched");
                    return Ok(series);
                }
                Err(error) => {
                    warn!(symbol, %source, %error, "price source failed, falling back");
                    failures.push(SourceFailure { source, error });
                }
            }
        }

        Err(AllSourcesFailed {
            symbol: symbol.to_string(),
            failures,
        })
    }

    fn try_provider(
        &self,
        provider: &dyn PriceProvider,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<PriceSeries, DataError> {
        let raw = provider.fetch_raw(symbol, lookback, interval)?;
        // Validated in `new`
        let mapping = self
            .mappings
            .get(provider.id())
            .ok_or_else(|| DataError::MissingPriceColumn {
                provider: provider.id(),
                available: Vec::new(),
            })?;
        Canonicalizer::to_series(&raw, mapping)
    }
}
