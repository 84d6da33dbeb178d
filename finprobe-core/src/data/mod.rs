//! Provider adapters, canonical schema, and the price fallback chain

pub mod alpha_vantage;
pub mod canonicalize;
pub mod chain;
pub mod fred;
pub mod http;
pub mod news;
pub mod provider;
pub mod schema;
pub mod stooq;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use canonicalize::Canonicalizer;
pub use chain::{AllSourcesFailed, PriceChain, SourceFailure};
pub use fred::FredProvider;
pub use news::NewsApiProvider;
pub use provider::{
    DataError, FundamentalsProvider, Interval, Lookback, MacroProvider, NewsError, NewsProvider,
    ParseError, PriceProvider, ProviderId, RawPriceTable,
};
pub use schema::{ColumnMapping, MappingTable, PriceSchema, SchemaError};
pub use stooq::StooqProvider;
pub use yahoo::YahooProvider;
