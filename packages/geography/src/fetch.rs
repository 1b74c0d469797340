//! Boundary download with `ArcGIS` JSON fallback.

use envrisk_geography_models::BoundarySource;
use geojson::{FeatureCollection, JsonValue};

use crate::GeoError;
use crate::arcgis::feature_set_to_collection;
use crate::cache::BoundaryCache;

/// Returns `value` as a `FeatureCollection` if it is one.
fn as_feature_collection(value: &JsonValue) -> Option<FeatureCollection> {
    if value.get("type")?.as_str()? != "FeatureCollection" || !value["features"].is_array() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

/// Parses boundary JSON that is either a `GeoJSON` `FeatureCollection` or
/// an `ArcGIS` `FeatureSet`.
///
/// # Errors
///
/// * [`GeoError::Json`] if the text is not JSON
/// * [`GeoError::Conversion`] if it is neither shape
pub fn parse_boundaries(json: &str) -> Result<FeatureCollection, GeoError> {
    let value: JsonValue = serde_json::from_str(json)?;
    match as_feature_collection(&value) {
        Some(collection) => Ok(collection),
        None => feature_set_to_collection(&value),
    }
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<JsonValue, GeoError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(GeoError::conversion(format!(
            "Boundary request failed with status {}",
            resp.status()
        )));
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Downloads a source's boundaries.
///
/// The `GeoJSON` endpoint is tried first; if it fails or does not return
/// a `FeatureCollection`, the `ArcGIS` endpoint is fetched and converted.
///
/// # Errors
///
/// Returns [`GeoError`] if both endpoints fail, or the `GeoJSON` endpoint
/// fails and the source has no `ArcGIS` fallback.
pub async fn fetch_boundaries(
    client: &reqwest::Client,
    source: &BoundarySource,
) -> Result<FeatureCollection, GeoError> {
    log::info!("Fetching {} boundaries from {}", source.name, source.geojson_url);

    let primary_error = match get_json(client, &source.geojson_url).await {
        Ok(value) => {
            if let Some(collection) = as_feature_collection(&value) {
                log::info!(
                    "Fetched {} features as GeoJSON",
                    collection.features.len()
                );
                return Ok(collection);
            }
            GeoError::conversion("GeoJSON endpoint did not return a FeatureCollection")
        }
        Err(e) => e,
    };

    let Some(fallback_url) = &source.arcgis_url else {
        return Err(primary_error);
    };

    log::warn!("{primary_error}; falling back to ArcGIS JSON at {fallback_url}");
    let value = get_json(client, fallback_url).await?;
    let collection = feature_set_to_collection(&value)?;
    log::info!(
        "Fetched {} features as ArcGIS JSON",
        collection.features.len()
    );
    Ok(collection)
}

/// Like [`fetch_boundaries`], going through `cache`.
///
/// # Errors
///
/// Returns [`GeoError`] if the source is not cached and the fetch fails.
pub async fn fetch_cached(
    client: &reqwest::Client,
    cache: &BoundaryCache,
    source: &BoundarySource,
) -> Result<std::sync::Arc<FeatureCollection>, GeoError> {
    cache
        .get_or_try_insert_with(&source.cache_key(), || fetch_boundaries(client, source))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_geojson_directly() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "CNTY": "KING" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }
                }
            ]
        }"#;
        let collection = parse_boundaries(json).unwrap();
        assert_eq!(collection.features.len(), 1);
    }

    #[test]
    fn converts_arcgis_feature_sets() {
        let json = r#"{
            "geometryType": "esriGeometryPolygon",
            "features": [
                { "attributes": { "CNTY": "KING" }, "geometry": { "rings": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "attributes": { "CNTY": "NONE" } }
            ]
        }"#;
        let collection = parse_boundaries(json).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(
            collection.features[0].properties.as_ref().unwrap()["CNTY"],
            "KING"
        );
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(
            parse_boundaries(r#"{ "type": "Feature" }"#),
            Err(GeoError::Conversion { .. })
        ));
        assert!(matches!(
            parse_boundaries("not json"),
            Err(GeoError::Json(_))
        ));
    }
}
