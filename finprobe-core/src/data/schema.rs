use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::provider::ProviderId;

/// Date column shared by raw provider tables and the canonical frame.
pub const DATE_COLUMN: &str = "date";

/// The single canonical price column.
pub const ADJ_CLOSE_COLUMN: &str = "adj_close";

/// `NaiveDate::num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical representation of polars `Date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// A `date` series of polars `Date` type.
pub fn date_series(dates: &[NaiveDate]) -> PolarsResult<Series> {
    let days: Vec<i32> = dates.iter().map(|d| date_to_days(*d)).collect();
    Series::new(DATE_COLUMN.into(), days).cast(&DataType::Date)
}

/// Build a raw provider table: a `date` column followed by the provider's
/// own columns, under the provider's own names.
pub fn raw_frame(
    dates: &[NaiveDate],
    columns: Vec<(&str, Vec<Option<f64>>)>,
) -> PolarsResult<DataFrame> {
    let mut cols = Vec::with_capacity(columns.len() + 1);
    cols.push(date_series(dates)?.into_column());
    for (name, values) in columns {
        cols.push(Series::new(name.into(), values).into_column());
    }
    DataFrame::new(cols)
}

/// Expected schema for a normalized price frame
pub struct PriceSchema;

impl PriceSchema {
    /// Get the canonical price schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(DATE_COLUMN.into(), DataType::Date),
            Field::new(ADJ_CLOSE_COLUMN.into(), DataType::Float64),
        ])
    }

    /// Validate DataFrame against schema. Extra columns are rejected: a
    /// normalized frame carries exactly one price column.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        if let Some(extra) = df
            .get_column_names()
            .into_iter()
            .find(|name| !expected.contains(name.as_str()))
        {
            return Err(SchemaError::UnexpectedColumn(extra.to_string()));
        }

        Ok(())
    }
}

/// Where a provider keeps its closing price, in order of preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub provider: ProviderId,
    pub candidates: Vec<String>,
}

impl ColumnMapping {
    pub fn new(provider: ProviderId, candidates: &[&str]) -> Self {
        Self {
            provider,
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// First candidate present in `available`.
    pub fn resolve<'a>(&'a self, available: &[&str]) -> Option<&'a str> {
        self.candidates
            .iter()
            .map(String::as_str)
            .find(|c| available.contains(c))
    }

    /// Every candidate present in `available`, in preference order.
    pub fn present<'a>(&'a self, available: &[&str]) -> Vec<&'a str> {
        self.candidates
            .iter()
            .map(String::as_str)
            .filter(|c| available.contains(c))
            .collect()
    }
}

/// Explicit provider-column → `adj_close` mapping for every price provider.
#[derive(Debug, Clone)]
pub struct MappingTable {
    mappings: BTreeMap<ProviderId, ColumnMapping>,
}

impl MappingTable {
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    pub fn with(mut self, mapping: ColumnMapping) -> Self {
        self.mappings.insert(mapping.provider, mapping);
        self
    }

    pub fn get(&self, provider: ProviderId) -> Option<&ColumnMapping> {
        self.mappings.get(&provider)
    }

    /// Fail fast if any provider in use has no usable mapping.
    pub fn validate(&self, providers: &[ProviderId]) -> Result<(), SchemaError> {
        for provider in providers {
            match self.mappings.get(provider) {
                None => return Err(SchemaError::UnmappedProvider(*provider)),
                Some(m) if m.candidates.is_empty() => {
                    return Err(SchemaError::EmptyMapping(*provider))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Default for MappingTable {
    /// yfinance-style `Adj Close` (falling back to `Close`), Alpha Vantage's
    /// numbered `4. close`, and Stooq's `Close`.
    fn default() -> Self {
        Self::empty()
            .with(ColumnMapping::new(ProviderId::Yahoo, &["Adj Close", "Close"]))
            .with(ColumnMapping::new(ProviderId::AlphaVantage, &["4. close"]))
            .with(ColumnMapping::new(ProviderId::Stooq, &["Close"]))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unexpected column in normalized frame: {0}")]
    UnexpectedColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("No column mapping configured for provider {0}")]
    UnmappedProvider(ProviderId),

    #[error("Column mapping for provider {0} lists no candidate columns")]
    EmptyMapping(ProviderId),

    #[error("Price chain has no providers")]
    NoProviders,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_all_required_columns() {
        let schema = PriceSchema::schema();
        assert!(schema.contains("date"));
        assert!(schema.contains("adj_close"));
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_epoch_conversion() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_days(epoch), 0);
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(date_to_days(d), 19_724);
        assert_eq!(days_to_date(19_724), Some(d));
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let df = DataFrame::new(vec![
            date_series(&[NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()])
                .unwrap()
                .into_column(),
        ])
        .unwrap();

        let result = PriceSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::MissingColumn(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let df = DataFrame::new(vec![
            date_series(&[NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()])
                .unwrap()
                .into_column(),
            Series::new("adj_close".into(), &["not_a_number"]).into_column(),
        ])
        .unwrap();

        let result = PriceSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_validate_rejects_second_price_column() {
        let df = raw_frame(
            &[NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            vec![("adj_close", vec![Some(1.0)]), ("Close", vec![Some(1.0)])],
        )
        .unwrap();

        let result = PriceSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::UnexpectedColumn(c) if c == "Close"));
    }

    #[test]
    fn test_mapping_prefers_first_candidate() {
        let table = MappingTable::default();
        let yahoo = table.get(ProviderId::Yahoo).unwrap();
        assert_eq!(yahoo.resolve(&["date", "Close", "Adj Close"]), Some("Adj Close"));
        assert_eq!(yahoo.resolve(&["date", "Close"]), Some("Close"));
        assert_eq!(yahoo.resolve(&["date", "Open"]), None);
    }

    #[test]
    fn test_mapping_lists_present_candidates_in_order() {
        let table = MappingTable::default();
        let yahoo = table.get(ProviderId::Yahoo).unwrap();
        assert_eq!(
            yahoo.present(&["date", "Close", "Adj Close"]),
            vec!["Adj Close", "Close"]
        );
        assert_eq!(yahoo.present(&["date", "Close"]), vec!["Close"]);
        assert!(yahoo.present(&["date", "Open"]).is_empty());
    }

    #[test]
    fn test_mapping_table_validation() {
        let table = MappingTable::default();
        assert!(table
            .validate(&[ProviderId::Yahoo, ProviderId::AlphaVantage, ProviderId::Stooq])
            .is_ok());
        assert!(matches!(
            table.validate(&[ProviderId::Fred]),
            Err(SchemaError::UnmappedProvider(ProviderId::Fred))
        ));

        let broken = MappingTable::empty().with(ColumnMapping::new(ProviderId::Stooq, &[]));
        assert!(matches!(
            broken.validate(&[ProviderId::Stooq]),
            Err(SchemaError::EmptyMapping(ProviderId::Stooq))
        ));
    }
}
