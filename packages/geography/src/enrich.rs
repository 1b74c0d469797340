//! Joining scenario values onto county boundary features by name.
//!
//! Enrichment is total: every input feature comes back, matched or not,
//! with `isDataAvailable` set. Inputs are never mutated.

use std::collections::BTreeMap;

use envrisk_geography_models::{
    EnrichedEntity, EnrichmentSummary, MISSING_NAME, ScenarioRecord, UNKNOWN_NAME,
};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};

use crate::normalize::{county_name, normalize_name};

const NAME_PROPERTY: &str = "CNTY";
const RISK_SCORE_PROPERTY: &str = "riskScore";
const PREDICTED_VALUE_PROPERTY: &str = "predictedValue";
const DATA_AVAILABLE_PROPERTY: &str = "isDataAvailable";

/// Scenario records keyed by normalized name. A later record with the
/// same normalized name replaces an earlier one.
pub struct RecordLookup<'a> {
    records: BTreeMap<String, &'a ScenarioRecord>,
}

impl<'a> RecordLookup<'a> {
    #[must_use]
    pub fn new(records: &'a [ScenarioRecord]) -> Self {
        Self {
            records: records
                .iter()
                .map(|r| (normalize_name(&r.name), r))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a ScenarioRecord> {
        self.records.get(&normalize_name(name)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolves the enrichment attributes for one feature.
///
/// A feature with no geometry or no properties resolves to
/// [`MISSING_NAME`]; one whose properties carry no known name field
/// resolves to [`UNKNOWN_NAME`]. Neither can match.
#[must_use]
pub fn resolve_entity(feature: &Feature, lookup: &RecordLookup<'_>) -> EnrichedEntity {
    let properties = match &feature.properties {
        Some(p) if !p.is_empty() && feature.geometry.is_some() => p,
        _ => return EnrichedEntity::unmatched(MISSING_NAME),
    };

    let Some(name) = county_name(properties) else {
        return EnrichedEntity::unmatched(UNKNOWN_NAME);
    };

    match lookup.get(&name) {
        Some(record) => EnrichedEntity::matched(name, record),
        None => EnrichedEntity::unmatched(name),
    }
}

/// Returns a copy of `feature` with the entity's attributes merged into
/// its properties.
#[must_use]
pub fn apply_entity(feature: &Feature, entity: &EnrichedEntity) -> Feature {
    let mut properties: JsonObject = feature.properties.clone().unwrap_or_default();
    properties.insert(
        NAME_PROPERTY.to_string(),
        JsonValue::from(entity.county_name.clone()),
    );
    properties.insert(
        RISK_SCORE_PROPERTY.to_string(),
        JsonValue::from(entity.risk_score),
    );
    properties.insert(
        PREDICTED_VALUE_PROPERTY.to_string(),
        JsonValue::from(entity.predicted_value),
    );
    properties.insert(
        DATA_AVAILABLE_PROPERTY.to_string(),
        JsonValue::from(entity.is_data_available),
    );

    Feature {
        properties: Some(properties),
        ..feature.clone()
    }
}

/// Enriches every feature with the matching scenario record, if any.
///
/// Output has the same length and order as `features`.
#[must_use]
pub fn enrich(features: &[Feature], records: &[ScenarioRecord]) -> Vec<Feature> {
    enrich_with_summary(features, records).0
}

/// Like [`enrich`], also counting matches.
#[must_use]
pub fn enrich_with_summary(
    features: &[Feature],
    records: &[ScenarioRecord],
) -> (Vec<Feature>, EnrichmentSummary) {
    let lookup = RecordLookup::new(records);
    let mut summary = EnrichmentSummary::default();

    let enriched = features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let entity = resolve_entity(feature, &lookup);
            if entity.county_name == MISSING_NAME {
                log::warn!("Feature {i} has no usable properties or geometry");
            } else if !entity.is_data_available {
                log::warn!(
                    "No scenario data for county {} (original: {})",
                    normalize_name(&entity.county_name),
                    entity.county_name
                );
            }
            summary.record(&entity);
            apply_entity(feature, &entity)
        })
        .collect();

    log::info!(
        "Enriched {} features: {} with scenario data, {} without ({} records)",
        summary.total,
        summary.matched,
        summary.unmatched,
        lookup.len()
    );

    (enriched, summary)
}

/// Enriches a whole collection, keeping its bounding box and foreign
/// members.
#[must_use]
pub fn enrich_collection(
    collection: &FeatureCollection,
    records: &[ScenarioRecord],
) -> (FeatureCollection, EnrichmentSummary) {
    let (features, summary) = enrich_with_summary(&collection.features, records);
    (
        FeatureCollection {
            features,
            ..collection.clone()
        },
        summary,
    )
}

#[cfg(test)]
mod tests {
    use geojson::{Geometry, Value};
    use serde_json::json;

    use super::*;

    fn square() -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]]))
    }

    fn feature(properties: &serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(square()),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    fn record(name: &str, normalized: f64, predicted: f64) -> ScenarioRecord {
        ScenarioRecord {
            name: name.to_string(),
            normalized_value: normalized,
            predicted_value: predicted,
        }
    }

    fn prop<'a>(feature: &'a Feature, key: &str) -> &'a JsonValue {
        &feature.properties.as_ref().unwrap()[key]
    }

    #[test]
    fn county_suffix_and_case_do_not_block_a_match() {
        let features = vec![feature(&json!({ "CNTY": "King County" }))];

        for name in ["KING", "King", "king county"] {
            let enriched = enrich(&features, &[record(name, 0.7, 12.5)]);
            assert_eq!(prop(&enriched[0], "isDataAvailable"), true, "{name}");
            assert_eq!(prop(&enriched[0], "riskScore"), 0.7);
            assert_eq!(prop(&enriched[0], "predictedValue"), 12.5);
            assert_eq!(prop(&enriched[0], "CNTY"), "King County");
        }
    }

    #[test]
    fn unmatched_features_are_kept_and_flagged() {
        let features = vec![
            feature(&json!({ "JURNM": "PIERCE", "OBJECTID": 2 })),
            feature(&json!({ "CNTY": "KING" })),
        ];
        let (enriched, summary) = enrich_with_summary(&features, &[record("King", 0.4, 1.0)]);

        assert_eq!(enriched.len(), features.len());
        assert_eq!(prop(&enriched[0], "isDataAvailable"), false);
        assert_eq!(prop(&enriched[0], "riskScore"), 0.0);
        assert_eq!(prop(&enriched[0], "predictedValue"), 0.0);
        assert_eq!(prop(&enriched[0], "OBJECTID"), 2);
        assert_eq!(prop(&enriched[0], "CNTY"), "PIERCE");
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched_names, vec!["PIERCE".to_string()]);
    }

    #[test]
    fn features_without_properties_or_geometry_become_missing() {
        let mut no_geometry = feature(&json!({ "CNTY": "KING" }));
        no_geometry.geometry = None;
        let features = vec![feature(&json!({})), no_geometry, {
            let mut f = feature(&json!({}));
            f.properties = None;
            f
        }];

        let enriched = enrich(&features, &[record("King", 0.4, 1.0)]);
        assert_eq!(enriched.len(), 3);
        for f in &enriched {
            assert_eq!(prop(f, "CNTY"), MISSING_NAME);
            assert_eq!(prop(f, "isDataAvailable"), false);
        }
    }

    #[test]
    fn features_without_a_name_field_are_unknown() {
        let enriched = enrich(&[feature(&json!({ "OBJECTID": 9 }))], &[]);
        assert_eq!(prop(&enriched[0], "CNTY"), UNKNOWN_NAME);
        assert_eq!(prop(&enriched[0], "isDataAvailable"), false);
    }

    #[test]
    fn input_is_not_mutated() {
        let features = vec![feature(&json!({ "CNTY": "KING" }))];
        let before = features.clone();
        let _ = enrich(&features, &[record("King", 0.4, 1.0)]);
        assert_eq!(features, before);
    }

    #[test]
    fn later_duplicate_records_win() {
        let features = vec![feature(&json!({ "CNTY": "KING" }))];
        let enriched = enrich(
            &features,
            &[record("King", 0.1, 1.0), record("KING COUNTY", 0.9, 2.0)],
        );
        assert_eq!(prop(&enriched[0], "riskScore"), 0.9);
    }

    #[test]
    fn collection_keeps_foreign_members() {
        let collection = FeatureCollection {
            bbox: None,
            features: vec![feature(&json!({ "CNTY": "KING" }))],
            foreign_members: json!({ "source": "wadnr" }).as_object().cloned(),
        };
        let (enriched, summary) = enrich_collection(&collection, &[record("King", 0.4, 1.0)]);
        assert_eq!(enriched.foreign_members, collection.foreign_members);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.matched, 1);
    }
}
