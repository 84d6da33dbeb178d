//! Canonical price series: the output of the price fallback chain.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::provider::{DataError, ProviderId};
use crate::data::schema::{days_to_date, PriceSchema, ADJ_CLOSE_COLUMN, DATE_COLUMN};

/// One trading period's closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Normalized price history for one symbol.
///
/// Dates are strictly increasing. The only price field is `adj_close`,
/// whatever the serving provider called it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub source: ProviderId,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The last `n` points (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    /// Simple return from first to last close.
    pub fn total_return(&self) -> Option<f64> {
        let first = self.first()?.adj_close;
        let last = self.last()?.adj_close;
        (first != 0.0).then(|| last / first - 1.0)
    }

    /// Canonical frame view: `date` (Date) and `adj_close` (Float64).
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        let closes: Vec<f64> = self.points.iter().map(|p| p.adj_close).collect();
        DataFrame::new(vec![
            crate::data::schema::date_series(&dates)?.into_column(),
            Series::new(ADJ_CLOSE_COLUMN.into(), closes).into_column(),
        ])
    }

    /// Read a canonical frame back into points. The frame must already be
    /// sorted and deduplicated.
    pub(crate) fn from_frame(
        symbol: &str,
        source: ProviderId,
        df: &DataFrame,
    ) -> Result<Self, DataError> {
        PriceSchema::validate(df).map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;

        let days = df.column(DATE_COLUMN)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let closes = df.column(ADJ_CLOSE_COLUMN)?.f64()?;

        let mut points = Vec::with_capacity(df.height());
        for (day, close) in days.into_iter().zip(closes.into_iter()) {
            let (Some(day), Some(adj_close)) = (day, close) else {
                continue;
            };
            let date = days_to_date(day).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("date out of range: {day}"))
            })?;
            points.push(PricePoint { date, adj_close });
        }

        Ok(Self {
            symbol: symbol.to_string(),
            source,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries {
            symbol: "AAPL".into(),
            source: ProviderId::Yahoo,
            points: closes
                .iter()
                .enumerate()
                .map(|(i, &c)| PricePoint {
                    date: start + chrono::Days::new(i as u64),
                    adj_close: c,
                })
                .collect(),
        }
    }

    #[test]
    fn frame_view_has_canonical_columns() {
        let s = series(&[100.0, 101.0, 99.5]);
        let df = s.to_frame().unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 3);
        assert!(PriceSchema::validate(&df).is_ok());

        let back = PriceSeries::from_frame("AAPL", ProviderId::Yahoo, &df).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn tail_and_return() {
        let s = series(&[100.0, 110.0, 121.0]);
        assert_eq!(s.tail(2).len(), 2);
        assert_eq!(s.tail(10).len(), 3);
        assert!((s.total_return().unwrap() - 0.21).abs() < 1e-12);
        assert_eq!(series(&[]).total_return(), None);
    }
}
