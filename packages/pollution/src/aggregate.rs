//! Monthly aggregation of raw readings.
//!
//! Readings are grouped by `(year, month)`, then by exact coordinate within
//! each month. Every location average is normalized against one maximum
//! taken over the whole input, so the same average renders identically in
//! every month.

use std::collections::BTreeMap;

use envrisk_pollution_models::{AggregatedDataPoint, MonthlyAggregate, RawReading};

/// Bit pattern of a coordinate, with `-0.0` folded into `0.0` so the two
/// land in the same location.
#[allow(clippy::float_cmp)]
fn coordinate_key(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

/// Running totals for one location in one month.
struct LocationTotals {
    latitude: f64,
    longitude: f64,
    sum: f64,
    count: u64,
}

impl LocationTotals {
    #[allow(clippy::cast_precision_loss)]
    fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Locations of one month, in first-seen order.
#[derive(Default)]
struct MonthBucket {
    index: BTreeMap<(u64, u64), usize>,
    locations: Vec<LocationTotals>,
}

impl MonthBucket {
    fn add(&mut self, reading: &RawReading) {
        let key = (
            coordinate_key(reading.latitude),
            coordinate_key(reading.longitude),
        );
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.locations.push(LocationTotals {
                latitude: reading.latitude,
                longitude: reading.longitude,
                sum: 0.0,
                count: 0,
            });
            self.locations.len() - 1
        });
        let totals = &mut self.locations[slot];
        totals.sum += reading.amount;
        totals.count += 1;
    }
}

/// Formats the `"YYYY-MM"` grouping key.
#[must_use]
pub fn year_month_key(year: i32, month: u32) -> String {
    format!("{year}-{month:02}")
}

/// Groups `readings` into chronologically sorted monthly aggregates.
///
/// Invalid readings (non-finite values, month outside `1..=12`) are
/// dropped with a warning. Returns an empty timeline if nothing valid
/// remains.
///
/// Normalization divides by the largest location average, not the largest
/// raw reading, so the busiest location always reaches exactly 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(readings: &[RawReading]) -> Vec<MonthlyAggregate> {
    // BTreeMap keyed by (year, month) keeps months in chronological order.
    let mut months: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    let mut dropped = 0usize;

    for reading in readings {
        if !reading.is_valid() {
            dropped += 1;
            continue;
        }
        months
            .entry((reading.year, reading.month))
            .or_default()
            .add(reading);
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {dropped} of {} readings with invalid fields",
            readings.len()
        );
    }

    let global_max = months
        .values()
        .flat_map(|bucket| bucket.locations.iter().map(LocationTotals::average))
        .fold(f64::NEG_INFINITY, f64::max);
    let normalize = |average: f64| {
        if global_max > 0.0 {
            (average / global_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    let aggregates: Vec<MonthlyAggregate> = months
        .into_iter()
        .map(|((year, month), bucket)| {
            let mut total_readings = 0u64;
            let mut weighted_sum = 0.0;
            let mut max_amount = f64::NEG_INFINITY;
            let mut min_amount = f64::INFINITY;

            let data_points: Vec<AggregatedDataPoint> = bucket
                .locations
                .iter()
                .map(|location| {
                    let average = location.average();
                    total_readings += location.count;
                    weighted_sum += average * location.count as f64;
                    max_amount = max_amount.max(average);
                    min_amount = min_amount.min(average);

                    AggregatedDataPoint {
                        coordinates: [location.longitude, location.latitude],
                        average_amount: average,
                        reading_count: location.count,
                        normalized_amount: normalize(average),
                    }
                })
                .collect();

            MonthlyAggregate {
                year_month: year_month_key(year, month),
                year,
                month,
                data_points,
                total_readings,
                average_amount: weighted_sum / total_readings as f64,
                max_amount,
                min_amount,
            }
        })
        .collect();

    log::debug!(
        "Aggregated {} readings into {} months (global max {global_max:.4})",
        readings.len() - dropped,
        aggregates.len()
    );

    aggregates
}

/// The largest location average in a timeline: the amount that normalizes
/// to 1. `None` for an empty timeline.
#[must_use]
pub fn peak_average(months: &[MonthlyAggregate]) -> Option<f64> {
    months
        .iter()
        .flat_map(|m| m.data_points.iter().map(|p| p.average_amount))
        .reduce(f64::max)
}
