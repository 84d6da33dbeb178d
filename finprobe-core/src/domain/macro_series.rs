//! Macroeconomic indicator series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::provider::ProviderId;

/// One dated observation of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Whether the upstream source produced the series.
///
/// An `Unavailable` series is always empty. An `Available` series may still be
/// empty when the source had no observations in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeriesStatus {
    Available,
    Unavailable { reason: String },
}

/// Ordered observations for a single named indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeries {
    pub series_id: String,
    pub source: ProviderId,
    pub observations: Vec<Observation>,
    pub status: SeriesStatus,
}

impl MacroSeries {
    /// Build an available series. Observations are sorted by date.
    pub fn available(
        series_id: impl Into<String>,
        source: ProviderId,
        mut observations: Vec<Observation>,
    ) -> Self {
        observations.sort_by_key(|o| o.date);
        Self {
            series_id: series_id.into(),
            source,
            observations,
            status: SeriesStatus::Available,
        }
    }

    /// The fail-safe value: empty, with the reason recorded.
    pub fn unavailable(
        series_id: impl Into<String>,
        source: ProviderId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            source,
            observations: Vec::new(),
            status: SeriesStatus::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, SeriesStatus::Available)
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn available_series_is_sorted() {
        let s = MacroSeries::available(
            "CPIAUCSL",
            ProviderId::Fred,
            vec![
                Observation { date: d(2024, 3, 1), value: 3.0 },
                Observation { date: d(2024, 1, 1), value: 1.0 },
                Observation { date: d(2024, 2, 1), value: 2.0 },
            ],
        );
        assert!(s.is_available());
        assert_eq!(s.latest().unwrap().value, 3.0);
        assert_eq!(s.observations[0].date, d(2024, 1, 1));
    }

    #[test]
    fn unavailable_series_is_empty() {
        let s = MacroSeries::unavailable("CPIAUCSL", ProviderId::Fred, "no key");
        assert!(s.is_empty());
        assert!(!s.is_available());
        assert_eq!(
            s.status,
            SeriesStatus::Unavailable { reason: "no key".into() }
        );
    }
}
