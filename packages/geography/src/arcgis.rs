//! `ArcGIS` JSON `FeatureSet` to `GeoJSON` conversion.
//!
//! `ArcGIS` services queried with `f=json` return features as
//! `{ "attributes": {...}, "geometry": { "rings": [...] } }`. Map layers
//! and enrichment expect `GeoJSON` `{ "properties", "geometry" }`.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::GeoError;

type Ring = Vec<Vec<f64>>;

/// Converts an `ArcGIS` `FeatureSet` into a `FeatureCollection`.
///
/// `attributes` become `properties`. Features whose geometry cannot be
/// converted are dropped with a warning.
///
/// # Errors
///
/// Returns [`GeoError::Conversion`] if the response has no `features`
/// array or reports an `ArcGIS` error.
pub fn feature_set_to_collection(feature_set: &JsonValue) -> Result<FeatureCollection, GeoError> {
    if let Some(error) = feature_set.get("error") {
        return Err(GeoError::conversion(format!(
            "ArcGIS API error: {}",
            error["message"].as_str().unwrap_or("unknown error")
        )));
    }

    let features = feature_set["features"]
        .as_array()
        .ok_or_else(|| GeoError::conversion("Invalid ArcGIS data: missing features array"))?;

    let mut dropped = 0usize;
    let converted: Vec<Feature> = features
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let feature = convert_feature(raw);
            if feature.is_none() {
                log::warn!(
                    "Filtering out ArcGIS feature {i} with invalid geometry: {}",
                    raw.get("geometry").unwrap_or(&JsonValue::Null)
                );
                dropped += 1;
            }
            feature
        })
        .collect();

    log::debug!(
        "Converted {} ArcGIS features ({dropped} dropped)",
        converted.len()
    );

    Ok(FeatureCollection {
        bbox: None,
        features: converted,
        foreign_members: None,
    })
}

fn convert_feature(raw: &JsonValue) -> Option<Feature> {
    let geometry = convert_geometry(raw.get("geometry")?)?;
    let properties: JsonObject = raw
        .get("attributes")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default();

    Some(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Accepts Esri ring geometry, or geometry that is already `GeoJSON`.
fn convert_geometry(geometry: &JsonValue) -> Option<Geometry> {
    if geometry.get("rings").is_some() {
        return rings_to_geometry(geometry);
    }
    if geometry.get("type").is_some() && geometry.get("coordinates").is_some() {
        return serde_json::from_value(geometry.clone()).ok();
    }
    None
}

/// One ring becomes a `Polygon`. Several rings become a `MultiPolygon`
/// with each ring as its own single-ring polygon; holes are not
/// detected.
fn rings_to_geometry(esri_geometry: &JsonValue) -> Option<Geometry> {
    let mut rings: Vec<Ring> = serde_json::from_value(esri_geometry.get("rings")?.clone()).ok()?;
    rings.retain(|ring| !ring.is_empty());

    let value = match rings.len() {
        0 => return None,
        1 => Value::Polygon(rings),
        _ => Value::MultiPolygon(rings.into_iter().map(|ring| vec![ring]).collect()),
    };
    Some(Geometry::new(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ring(x: f64) -> serde_json::Value {
        json!([[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 0.0]])
    }

    #[test]
    fn attributes_become_properties() {
        let set = json!({
            "features": [
                { "attributes": { "CNTY": "KING", "OBJECTID": 17 }, "geometry": { "rings": [ring(0.0)] } }
            ]
        });
        let collection = feature_set_to_collection(&set).unwrap();

        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.properties.as_ref().unwrap()["CNTY"], "KING");
        assert!(matches!(
            feature.geometry.as_ref().unwrap().value,
            Value::Polygon(ref rings) if rings.len() == 1 && rings[0].len() == 4
        ));
    }

    #[test]
    fn multiple_rings_become_a_multipolygon() {
        let set = json!({
            "features": [
                { "attributes": {}, "geometry": { "rings": [ring(0.0), ring(5.0)] } }
            ]
        });
        let collection = feature_set_to_collection(&set).unwrap();

        match &collection.features[0].geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 2);
                assert!((polygons[1][0][0][0] - 5.0).abs() < f64::EPSILON);
            }
            other => panic!("expected MultiPolygon, got {other:?}"),
        }
    }

    #[test]
    fn geojson_geometry_passes_through() {
        let set = json!({
            "features": [
                { "attributes": { "CNTY": "PIERCE" }, "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } }
            ]
        });
        let collection = feature_set_to_collection(&set).unwrap();
        assert!(matches!(
            collection.features[0].geometry.as_ref().unwrap().value,
            Value::Point(_)
        ));
    }

    #[test]
    fn invalid_geometry_is_filtered() {
        let set = json!({
            "features": [
                { "attributes": { "CNTY": "A" } },
                { "attributes": { "CNTY": "B" }, "geometry": null },
                { "attributes": { "CNTY": "C" }, "geometry": { "rings": [] } },
                { "attributes": { "CNTY": "D" }, "geometry": { "x": 1.0, "y": 2.0 } },
                { "attributes": { "CNTY": "E" }, "geometry": { "rings": [ring(0.0)] } }
            ]
        });
        let collection = feature_set_to_collection(&set).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(
            collection.features[0].properties.as_ref().unwrap()["CNTY"],
            "E"
        );
    }

    #[test]
    fn missing_attributes_give_empty_properties() {
        let set = json!({ "features": [{ "geometry": { "rings": [ring(0.0)] } }] });
        let collection = feature_set_to_collection(&set).unwrap();
        assert!(collection.features[0].properties.as_ref().unwrap().is_empty());
    }

    #[test]
    fn missing_features_array_is_an_error() {
        assert!(matches!(
            feature_set_to_collection(&json!({ "fields": [] })),
            Err(GeoError::Conversion { .. })
        ));
        assert!(matches!(
            feature_set_to_collection(&json!({ "error": { "message": "Invalid token" } })),
            Err(GeoError::Conversion { message }) if message.contains("Invalid token")
        ));
    }
}
