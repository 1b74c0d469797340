#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for pollution readings and their monthly aggregates.
//!
//! Aggregates serialize with camelCase keys (`yearMonth`, `dataPoints`,
//! `normalizedAmount`, ...) so they can be handed straight to a map
//! renderer.

use serde::{Deserialize, Serialize};

/// A single pollutant measurement as read from a CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub amount: f64,
}

impl RawReading {
    /// Returns `true` if every numeric field is finite and the month is in
    /// `1..=12`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.amount.is_finite()
    }
}

/// All readings at one location within one month, averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDataPoint {
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
    pub average_amount: f64,
    pub reading_count: u64,
    /// `average_amount` divided by the dataset-wide maximum, in `[0, 1]`.
    pub normalized_amount: f64,
}

/// One month of readings for a single chemical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    /// `"YYYY-MM"`.
    pub year_month: String,
    pub year: i32,
    pub month: u32,
    pub data_points: Vec<AggregatedDataPoint>,
    pub total_readings: u64,
    /// Reading-weighted mean of the location averages.
    pub average_amount: f64,
    /// Largest location average.
    pub max_amount: f64,
    /// Smallest location average.
    pub min_amount: f64,
}

/// A data point labelled with the chemical it was measured for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedDataPoint {
    #[serde(flatten)]
    pub point: AggregatedDataPoint,
    pub chemical_id: String,
    /// The chemical's display name (e.g. `NO₂`), or its id when unknown.
    pub chemical_name: String,
}

/// One month across several chemicals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMonthlyAggregate {
    pub year_month: String,
    pub year: i32,
    pub month: u32,
    pub data_points: Vec<TaggedDataPoint>,
    pub total_readings: u64,
    pub average_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
}

/// Month-level statistics shared by single- and multi-chemical timelines.
pub trait MonthStats {
    fn year_month(&self) -> &str;
    fn total_readings(&self) -> u64;
    fn average_amount(&self) -> f64;
    fn max_amount(&self) -> f64;
    fn min_amount(&self) -> f64;
    fn point_count(&self) -> usize;
}

macro_rules! impl_month_stats {
    ($ty:ty) => {
        impl MonthStats for $ty {
            fn year_month(&self) -> &str {
                &self.year_month
            }
            fn total_readings(&self) -> u64 {
                self.total_readings
            }
            fn average_amount(&self) -> f64 {
                self.average_amount
            }
            fn max_amount(&self) -> f64 {
                self.max_amount
            }
            fn min_amount(&self) -> f64 {
                self.min_amount
            }
            fn point_count(&self) -> usize {
                self.data_points.len()
            }
        }
    };
}

impl_month_stats!(MonthlyAggregate);
impl_month_stats!(CombinedMonthlyAggregate);

/// First and last `yearMonth` of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Whole-timeline statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub months: usize,
    pub data_points: usize,
    pub total_readings: u64,
    pub date_range: Option<DateRange>,
    /// Mean of the monthly averages (unweighted).
    pub average_amount: f64,
    /// Largest monthly maximum.
    pub max_amount: f64,
    /// Smallest monthly minimum.
    pub min_amount: f64,
}

impl TimelineSummary {
    /// Summarises a chronologically sorted timeline. An empty timeline has
    /// no date range and zero statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_months<M: MonthStats>(months: &[M]) -> Self {
        let date_range = match (months.first(), months.last()) {
            (Some(first), Some(last)) => Some(DateRange {
                start: first.year_month().to_string(),
                end: last.year_month().to_string(),
            }),
            _ => None,
        };

        let (average_amount, max_amount, min_amount) = if months.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                months.iter().map(MonthStats::average_amount).sum::<f64>() / months.len() as f64,
                months
                    .iter()
                    .map(MonthStats::max_amount)
                    .fold(f64::NEG_INFINITY, f64::max),
                months
                    .iter()
                    .map(MonthStats::min_amount)
                    .fold(f64::INFINITY, f64::min),
            )
        };

        Self {
            months: months.len(),
            data_points: months.iter().map(MonthStats::point_count).sum(),
            total_readings: months.iter().map(MonthStats::total_readings).sum(),
            date_range,
            average_amount,
            max_amount,
            min_amount,
        }
    }
}

/// Static definition of a tracked chemical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalConfig {
    /// Short identifier, e.g. `no2`.
    pub id: String,
    pub name: String,
    pub display_name: String,
    /// CSV file holding the chemical's monthly readings.
    pub file_name: String,
    pub unit: String,
    pub description: String,
    /// Primary RGB color used for this chemical in legends.
    pub color: [u8; 3],
    /// Concentration (in `unit`) considered dangerous.
    pub danger_threshold: f64,
}

impl ChemicalConfig {
    /// Danger threshold as a fraction of `reference_max`, the value that
    /// normalizes to 1. `None` if the reference is not positive.
    #[must_use]
    pub fn danger_fraction(&self, reference_max: f64) -> Option<f64> {
        (reference_max.is_finite() && reference_max > 0.0)
            .then(|| self.danger_threshold / reference_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year_month: &str, total: u64, avg: f64, max: f64, min: f64) -> MonthlyAggregate {
        let (year, month) = year_month.split_once('-').unwrap();
        MonthlyAggregate {
            year_month: year_month.to_string(),
            year: year.parse().unwrap(),
            month: month.parse().unwrap(),
            data_points: vec![],
            total_readings: total,
            average_amount: avg,
            max_amount: max,
            min_amount: min,
        }
    }

    #[test]
    fn reading_validity() {
        let ok = RawReading {
            year: 2024,
            month: 12,
            latitude: 47.6,
            longitude: -122.3,
            amount: 0.2,
        };
        assert!(ok.is_valid());
        assert!(!RawReading { month: 13, ..ok }.is_valid());
        assert!(!RawReading { month: 0, ..ok }.is_valid());
        assert!(!RawReading {
            amount: f64::NAN,
            ..ok
        }
        .is_valid());
    }

    #[test]
    fn summary_of_timeline() {
        let months = vec![
            month("2023-12", 3, 1.0, 2.0, 0.5),
            month("2024-01", 5, 3.0, 4.0, 1.5),
        ];
        let summary = TimelineSummary::from_months(&months);
        assert_eq!(summary.months, 2);
        assert_eq!(summary.total_readings, 8);
        assert!((summary.average_amount - 2.0).abs() < 1e-12);
        assert!((summary.max_amount - 4.0).abs() < 1e-12);
        assert!((summary.min_amount - 0.5).abs() < 1e-12);
        assert_eq!(
            summary.date_range,
            Some(DateRange {
                start: "2023-12".to_string(),
                end: "2024-01".to_string()
            })
        );
    }

    #[test]
    fn summary_of_empty_timeline() {
        let summary = TimelineSummary::from_months::<MonthlyAggregate>(&[]);
        assert_eq!(summary.months, 0);
        assert!(summary.date_range.is_none());
        assert!(summary.max_amount.abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_serializes_camel_case() {
        let json = serde_json::to_value(month("2024-01", 1, 1.0, 1.0, 1.0)).unwrap();
        assert_eq!(json["yearMonth"], "2024-01");
        assert!(json.get("totalReadings").is_some());
    }

    #[test]
    fn tagged_point_flattens() {
        let tagged = TaggedDataPoint {
            point: AggregatedDataPoint {
                coordinates: [-122.3, 47.6],
                average_amount: 2.0,
                reading_count: 1,
                normalized_amount: 0.5,
            },
            chemical_id: "no2".to_string(),
            chemical_name: "NO₂".to_string(),
        };
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["chemicalId"], "no2");
        assert_eq!(json["normalizedAmount"], 0.5);
    }

    #[test]
    fn danger_fraction_requires_positive_reference() {
        let chem = ChemicalConfig {
            id: "co".to_string(),
            name: "Carbon Monoxide".to_string(),
            display_name: "CO".to_string(),
            file_name: "co_data_by_month.csv".to_string(),
            unit: "ppm".to_string(),
            description: String::new(),
            color: [239, 68, 68],
            danger_threshold: 0.4,
        };
        assert!((chem.danger_fraction(0.5).unwrap() - 0.8).abs() < 1e-12);
        assert!(chem.danger_fraction(0.0).is_none());
    }
}
