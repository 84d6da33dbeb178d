//! finprobe core: provider adapters, price fallback chain, canonical schema,
//! and the keyword document classifier.
//!
//! This crate contains everything that talks to a data provider or derives
//! something from its output:
//! - Domain types (price series, financials, macro series, news documents)
//! - One adapter per provider (Yahoo, Alpha Vantage, Stooq, FRED, NewsAPI)
//! - Explicit column mapping table and the normalizer built on it
//! - The ordered price fallback chain
//! - Sentiment and routing classifiers

pub mod classify;
pub mod data;
pub mod domain;
