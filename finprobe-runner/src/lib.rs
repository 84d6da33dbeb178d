//! finprobe runner: configuration, the collection pipeline, and reports.
//!
//! This crate builds on `finprobe-core` to provide:
//! - `AppConfig` resolved from the environment and an optional TOML file
//! - The collection pipeline with per-data-kind failure policy
//! - Source tracking for every run
//! - Plain-text rendering of settings and results

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{AppConfig, ConfigError, Credentials, RunSettings};
pub use pipeline::{
    build_price_chain, prepare_memory_dir, Pipeline, PipelineError, RunReport, SourceTracker,
};
pub use report::{render_prices, render_settings, render_summary, PLAN};
