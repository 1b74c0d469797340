//! Merging several chemicals' timelines into one.

use std::collections::BTreeMap;

use envrisk_pollution_models::{
    ChemicalConfig, CombinedMonthlyAggregate, MonthlyAggregate, TaggedDataPoint,
};

use crate::aggregate::year_month_key;

/// Merges per-chemical timelines (keyed by chemical id) month by month.
///
/// Each data point is tagged with its chemical id and display name (looked
/// up in `chemicals`, falling back to the id). Readings are summed, the
/// average is weighted by readings, and max/min span all chemicals. Points
/// keep their per-chemical normalization. The result is chronological.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn combine_chemicals(
    timelines: &BTreeMap<String, Vec<MonthlyAggregate>>,
    chemicals: &[ChemicalConfig],
) -> Vec<CombinedMonthlyAggregate> {
    let display_name = |id: &str| {
        chemicals
            .iter()
            .find(|c| c.id == id)
            .map_or_else(|| id.to_string(), |c| c.display_name.clone())
    };

    let mut by_month: BTreeMap<(i32, u32), Vec<(&str, &MonthlyAggregate)>> = BTreeMap::new();
    for (chemical_id, months) in timelines {
        for month in months {
            by_month
                .entry((month.year, month.month))
                .or_default()
                .push((chemical_id.as_str(), month));
        }
    }

    by_month
        .into_iter()
        .filter_map(|((year, month), entries)| {
            let mut data_points = Vec::new();
            let mut total_readings = 0u64;
            let mut weighted_sum = 0.0;
            let mut max_amount = f64::NEG_INFINITY;
            let mut min_amount = f64::INFINITY;

            for (chemical_id, aggregate) in entries {
                let chemical_name = display_name(chemical_id);
                data_points.extend(aggregate.data_points.iter().map(|point| TaggedDataPoint {
                    point: point.clone(),
                    chemical_id: chemical_id.to_string(),
                    chemical_name: chemical_name.clone(),
                }));
                total_readings += aggregate.total_readings;
                weighted_sum += aggregate.average_amount * aggregate.total_readings as f64;
                max_amount = max_amount.max(aggregate.max_amount);
                min_amount = min_amount.min(aggregate.min_amount);
            }

            if data_points.is_empty() {
                return None;
            }

            Some(CombinedMonthlyAggregate {
                year_month: year_month_key(year, month),
                year,
                month,
                data_points,
                total_readings,
                average_amount: if total_readings > 0 {
                    weighted_sum / total_readings as f64
                } else {
                    0.0
                },
                max_amount,
                min_amount,
            })
        })
        .collect()
}
