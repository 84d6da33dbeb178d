//! Plain-text rendering of settings and run results.

use finprobe_core::classify::ClassificationResult;
use finprobe_core::domain::{PriceSeries, SeriesStatus};

use crate::config::AppConfig;
use crate::pipeline::RunReport;

/// Titles are cut to this many characters in the routing list.
pub const TITLE_WIDTH: usize = 60;

pub const PLAN: &str = "Plan: Get prices, financials, news, and macro; then classify and report.";

fn presence(present: bool) -> &'static str {
    if present {
        "Present"
    } else {
        "Missing"
    }
}

/// Cut `s` to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Current settings. Credentials are shown as Present/Missing only.
pub fn render_settings(config: &AppConfig) -> String {
    let creds = &config.credentials;
    let run = &config.run;
    let mut out = String::from("Current Settings:\n\n");
    out.push_str(&format!("Ticker: {}\n", run.ticker));
    out.push_str(&format!("Period: {} | Interval: {}\n", run.period, run.interval));
    out.push_str(&format!("Price sources: {}\n", run.price_providers.join(" -> ")));
    out.push_str(&format!(
        "Macro series: {} since {}\n",
        run.macro_series, run.macro_start
    ));
    out.push_str(&format!(
        "Alpha Vantage: {}\n",
        presence(creds.alphavantage_key.is_some())
    ));
    out.push_str(&format!("Fred API: {}\n", presence(creds.fred_key.is_some())));
    out.push_str(&format!("News API: {}\n", presence(creds.news_key.is_some())));
    out.push_str(&format!(
        "LLM: {} ({})\n",
        presence(creds.has_llm_key()),
        config.llm_model
    ));
    out
}

/// One routing line per classified document.
pub fn render_routing_line(result: &ClassificationResult) -> String {
    format!(
        "- {}... -> route={}, sentiment={}, reason={}",
        truncate_chars(&result.document.title, TITLE_WIDTH),
        result.route,
        result.sentiment,
        result.reason
    )
}

/// Row counts, serving sources and the routing list.
pub fn render_summary(report: &RunReport) -> String {
    let sources = &report.sources;
    let mut out = String::from("Data collection complete!\n\n");
    out.push_str(&format!(
        "Prices rows: {} | Financials rows: {} | Macro rows: {} | News articles: {}\n",
        report.prices.len(),
        report.financials.len(),
        report.macro_series.len(),
        report.news.len()
    ));

    let served = |s: Option<finprobe_core::data::ProviderId>| {
        s.map(|id| id.to_string()).unwrap_or_else(|| "none".into())
    };
    out.push_str(&format!(
        "Sources: prices={} financials={} macro={} news={} llm={}\n",
        served(sources.prices),
        served(sources.financials),
        served(sources.macro_series),
        served(sources.news),
        presence(sources.llm)
    ));
    if let Some(period) = report.financials.latest_ttm() {
        if let Some(margin) = period.ttm_margin {
            out.push_str(&format!(
                "Latest TTM margin: {:.1}% (FY ending {})\n",
                margin * 100.0,
                period.fiscal_date_ending
            ));
        }
    }
    match (&report.macro_series.status, report.macro_series.latest()) {
        (SeriesStatus::Unavailable { reason }, _) => out.push_str(&format!(
            "Macro series {} unavailable: {reason}\n",
            report.macro_series.series_id
        )),
        (SeriesStatus::Available, Some(obs)) => out.push_str(&format!(
            "Latest {}: {} on {}\n",
            report.macro_series.series_id, obs.value, obs.date
        )),
        (SeriesStatus::Available, None) => {}
    }

    out.push_str("\nRouting and Sentiment:\n");
    if report.news.is_empty() {
        out.push_str("(no articles)\n");
    }
    for result in &report.news {
        out.push_str(&render_routing_line(result));
        out.push('\n');
    }
    out
}

/// Serving source, row count and the last `n` rows.
pub fn render_prices(series: &PriceSeries, n: usize) -> String {
    let mut out = format!(
        "{}: {} rows from {}\n",
        series.symbol,
        series.len(),
        series.source
    );
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        out.push_str(&format!("Range: {} to {}\n", first.date, last.date));
    }
    if let Some(ret) = series.total_return() {
        out.push_str(&format!("Total return: {:+.2}%\n", ret * 100.0));
    }
    out.push_str("| Date | Adj Close |\n");
    out.push_str("|------|-----------|\n");
    for p in series.tail(n) {
        out.push_str(&format!("| {} | {:.2} |\n", p.date, p.adj_close));
    }
    out
}
