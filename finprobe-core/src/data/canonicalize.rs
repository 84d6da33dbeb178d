use polars::prelude::*;

use super::provider::{DataError, RawPriceTable};
use super::schema::{ColumnMapping, ADJ_CLOSE_COLUMN, DATE_COLUMN};
use crate::domain::PriceSeries;

/// Canonicalizer for provider price tables
pub struct Canonicalizer;

impl Canonicalizer {
    /// Map the provider's price columns onto `adj_close`, then sort and dedupe.
    ///
    /// Each row takes its value from the first mapped column that is non-null
    /// in that row. Values are carried unchanged; rows where every mapped
    /// column is null are dropped.
    pub fn normalize(raw: &RawPriceTable, mapping: &ColumnMapping) -> Result<DataFrame, DataError> {
        let available: Vec<&str> = raw
            .frame
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect();

        if !available.contains(&DATE_COLUMN) {
            return Err(DataError::ResponseFormatChanged(format!(
                "{} table has no '{DATE_COLUMN}' column",
                raw.provider
            )));
        }

        let price = Self::first_non_null(&mapping.present(&available)).ok_or_else(|| {
            DataError::MissingPriceColumn {
                provider: raw.provider,
                available: available.iter().map(|s| s.to_string()).collect(),
            }
        })?;

        let df = Self::canonicalize(
            raw.frame
                .clone()
                .lazy()
                .select([col(DATE_COLUMN), price.alias(ADJ_CLOSE_COLUMN)])
                .filter(col(ADJ_CLOSE_COLUMN).is_not_null()),
        )
        .collect()?;

        if df.height() == 0 {
            return Err(DataError::EmptyResult {
                symbol: raw.symbol.clone(),
            });
        }

        Ok(df)
    }

    /// Row-wise fallback across `columns`: the first non-null value wins.
    fn first_non_null(columns: &[&str]) -> Option<Expr> {
        let mut exprs = columns
            .iter()
            .rev()
            .map(|c| col(*c).cast(DataType::Float64));
        let last = exprs.next()?;
        Some(exprs.fold(last, |fallback, preferred| {
            when(preferred.clone().is_not_null())
                .then(preferred)
                .otherwise(fallback)
        }))
    }

    /// Sort by date and drop duplicated dates, keeping the first occurrence.
    pub fn canonicalize(df: LazyFrame) -> LazyFrame {
        df.sort(
            [DATE_COLUMN],
            SortMultipleOptions::default()
                .with_order_descending(false)
                .with_maintain_order(true),
        )
        .unique_stable(Some(vec![DATE_COLUMN.into()]), UniqueKeepStrategy::First)
    }

    /// Normalize straight into a [`PriceSeries`].
    pub fn to_series(
        raw: &RawPriceTable,
        mapping: &ColumnMapping,
    ) -> Result<PriceSeries, DataError> {
        let df = Self::normalize(raw, mapping)?;
        PriceSeries::from_frame(&raw.symbol, raw.provider, &df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::ProviderId;
    use crate::data::schema::{raw_frame, MappingTable, PriceSchema};
    use chrono::NaiveDate;

    fn dates(days: &[u32]) -> Vec<NaiveDate> {
        days.iter()
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, *d).unwrap())
            .collect()
    }

    fn table(provider: ProviderId, df: DataFrame) -> RawPriceTable {
        RawPriceTable {
            symbol: "AAPL".into(),
            provider,
            frame: df,
        }
    }

    fn yahoo_mapping() -> ColumnMapping {
        MappingTable::default().get(ProviderId::Yahoo).unwrap().clone()
    }

    fn normalize_yahoo(df: DataFrame) -> Result<DataFrame, DataError> {
        Canonicalizer::normalize(&table(ProviderId::Yahoo, df), &yahoo_mapping())
    }

    #[test]
    fn test_adj_close_is_renamed() {
        let df = raw_frame(
            &dates(&[2, 3, 4]),
            vec![
                ("Close", vec![Some(10.0), Some(11.0), Some(12.0)]),
                ("Adj Close", vec![Some(9.5), Some(10.5), Some(11.5)]),
            ],
        )
        .unwrap();

        let out = normalize_yahoo(df).unwrap();

        assert!(PriceSchema::validate(&out).is_ok());
        let prices = out.column("adj_close").unwrap().f64().unwrap();
        assert_eq!(prices.get(0), Some(9.5));
        assert_eq!(prices.get(2), Some(11.5));
    }

    #[test]
    fn test_close_only_is_renamed() {
        let df = raw_frame(
            &dates(&[2, 3]),
            vec![("Close", vec![Some(10.0), Some(11.0)])],
        )
        .unwrap();

        let out = normalize_yahoo(df).unwrap();

        assert_eq!(out.width(), 2);
        let prices = out.column("adj_close").unwrap().f64().unwrap();
        assert_eq!(prices.get(0), Some(10.0));
        assert_eq!(prices.get(1), Some(11.0));
    }

    #[test]
    fn test_no_price_column_fails() {
        let df = raw_frame(&dates(&[2]), vec![("Open", vec![Some(10.0)])]).unwrap();

        let err = normalize_yahoo(df).unwrap_err();

        match err {
            DataError::MissingPriceColumn { provider, available } => {
                assert_eq!(provider, ProviderId::Yahoo);
                assert_eq!(available, vec!["date".to_string(), "Open".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sorts_and_dedupes_dates() {
        let df = raw_frame(
            &dates(&[4, 2, 3, 2]),
            vec![("Close", vec![Some(4.0), Some(2.0), Some(3.0), Some(99.0)])],
        )
        .unwrap();

        let mapping = ColumnMapping::new(ProviderId::Stooq, &["Close"]);
        let series = Canonicalizer::to_series(&table(ProviderId::Stooq, df), &mapping).unwrap();

        let closes: Vec<f64> = series.points.iter().map(|p| p.adj_close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
        for w in series.points.windows(2) {
            assert!(w[0].date < w[1].date);
        }
    }

    #[test]
    fn test_null_prices_dropped_and_all_null_is_empty() {
        let df = raw_frame(
            &dates(&[2, 3]),
            vec![("Close", vec![None, Some(11.0)])],
        )
        .unwrap();
        let out = normalize_yahoo(df).unwrap();
        assert_eq!(out.height(), 1);

        let df = raw_frame(&dates(&[2]), vec![("Close", vec![None])]).unwrap();
        let err = normalize_yahoo(df).unwrap_err();
        assert!(matches!(err, DataError::EmptyResult { .. }));
    }

    #[test]
    fn test_missing_adj_close_falls_back_to_close_per_row() {
        let df = raw_frame(
            &dates(&[2, 3, 4]),
            vec![
                ("Close", vec![Some(185.64), Some(184.25), Some(181.91)]),
                ("Adj Close", vec![Some(184.73), None, Some(181.02)]),
            ],
        )
        .unwrap();

        let out = normalize_yahoo(df).unwrap();

        assert_eq!(out.height(), 3);
        let prices = out.column("adj_close").unwrap().f64().unwrap();
        assert_eq!(prices.get(0), Some(184.73));
        assert_eq!(prices.get(1), Some(184.25));
        assert_eq!(prices.get(2), Some(181.02));
    }
}
