//! Annual income-statement fundamentals with derived ratios.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::provider::ProviderId;

/// Number of annual periods retained.
pub const MAX_PERIODS: usize = 4;

/// Raw annual figures as reported, before derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeReport {
    pub fiscal_date_ending: NaiveDate,
    pub total_revenue: f64,
    pub gross_profit: f64,
}

/// One fiscal period with derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub fiscal_date_ending: NaiveDate,
    pub total_revenue: f64,
    pub gross_profit: f64,
    /// Revenue in billions.
    pub revenue_bil: f64,
    /// Gross profit / revenue for this period alone.
    pub gross_margin: f64,
    /// Mean gross margin of this period and the one before it in report order.
    /// `None` for the first row.
    pub ttm_margin: Option<f64>,
}

/// Up to four most recent annual periods, in provider order (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub symbol: String,
    pub source: ProviderId,
    pub periods: Vec<FinancialPeriod>,
}

impl Financials {
    /// Keep the first [`MAX_PERIODS`] reports and compute derived fields.
    pub fn from_reports(
        symbol: impl Into<String>,
        source: ProviderId,
        reports: impl IntoIterator<Item = IncomeReport>,
    ) -> Self {
        let kept: Vec<IncomeReport> = reports.into_iter().take(MAX_PERIODS).collect();
        let margins: Vec<f64> = kept
            .iter()
            .map(|r| r.gross_profit / r.total_revenue)
            .collect();

        let periods = kept
            .iter()
            .enumerate()
            .map(|(i, r)| FinancialPeriod {
                fiscal_date_ending: r.fiscal_date_ending,
                total_revenue: r.total_revenue,
                gross_profit: r.gross_profit,
                revenue_bil: r.total_revenue / 1e9,
                gross_margin: margins[i],
                ttm_margin: (i > 0).then(|| (margins[i - 1] + margins[i]) / 2.0),
            })
            .collect();

        Self {
            symbol: symbol.into(),
            source,
            periods,
        }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Most recent period that carries a rolling margin.
    pub fn latest_ttm(&self) -> Option<&FinancialPeriod> {
        self.periods.iter().find(|p| p.ttm_margin.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(year: i32, revenue: f64, gross: f64) -> IncomeReport {
        IncomeReport {
            fiscal_date_ending: NaiveDate::from_ymd_opt(year, 9, 30).unwrap(),
            total_revenue: revenue,
            gross_profit: gross,
        }
    }

    #[test]
    fn keeps_four_most_recent() {
        let reports = (0..6).map(|i| report(2024 - i, 100e9, 40e9));
        let f = Financials::from_reports("AAPL", ProviderId::AlphaVantage, reports);
        assert_eq!(f.len(), 4);
        assert_eq!(f.periods[0].fiscal_date_ending.to_string(), "2024-09-30");
        assert_eq!(f.periods[3].fiscal_date_ending.to_string(), "2021-09-30");
    }

    #[test]
    fn derives_revenue_and_rolling_margin() {
        let f = Financials::from_reports(
            "AAPL",
            ProviderId::AlphaVantage,
            vec![
                report(2024, 400e9, 200e9), // 0.50
                report(2023, 400e9, 160e9), // 0.40
                report(2022, 200e9, 60e9),  // 0.30
            ],
        );

        assert!((f.periods[0].revenue_bil - 400.0).abs() < 1e-9);
        assert_eq!(f.periods[0].ttm_margin, None);
        assert!((f.periods[1].ttm_margin.unwrap() - 0.45).abs() < 1e-12);
        assert!((f.periods[2].ttm_margin.unwrap() - 0.35).abs() < 1e-12);
        assert!((f.periods[2].gross_margin - 0.30).abs() < 1e-12);
    }

    #[test]
    fn latest_ttm_skips_the_row_without_a_margin() {
        let f = Financials::from_reports(
            "AAPL",
            ProviderId::AlphaVantage,
            vec![report(2024, 400e9, 200e9), report(2023, 400e9, 160e9)],
        );
        let latest = f.latest_ttm().unwrap();
        assert_eq!(latest.fiscal_date_ending.to_string(), "2023-09-30");
        assert!((latest.ttm_margin.unwrap() - 0.45).abs() < 1e-12);

        let single = Financials::from_reports(
            "AAPL",
            ProviderId::AlphaVantage,
            vec![report(2024, 1e9, 0.5e9)],
        );
        assert!(single.latest_ttm().is_none());
    }
}
