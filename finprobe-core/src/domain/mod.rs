//! Domain types: everything a run produces, held in memory only.

pub mod fundamentals;
pub mod macro_series;
pub mod news;
pub mod price;

pub use fundamentals::{FinancialPeriod, Financials, IncomeReport};
pub use macro_series::{MacroSeries, Observation, SeriesStatus};
pub use news::NewsDocument;
pub use price::{PricePoint, PriceSeries};
