//! In-memory county index for point lookups and region membership.
//!
//! County polygons are bulk-loaded into an R-tree keyed on their
//! envelopes; lookups filter by envelope first and then run an exact
//! point-in-polygon test.

use envrisk_spatial::region::Region;
use envrisk_spatial_models::{BoundingBox, LonLat};
use geo::{BoundingRect, Contains, MultiPolygon};
use geojson::{Feature, FeatureCollection};
use rstar::{AABB, RTree, RTreeObject};

use crate::GeoError;
use crate::normalize::county_name;

/// A county polygon stored in the R-tree with its name.
struct CountyEntry {
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for CountyEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of county polygons.
///
/// Implements [`Region`], so grid densification can be clipped to the
/// union of the indexed counties.
pub struct CountyIndex {
    counties: RTree<CountyEntry>,
    bounds: BoundingBox,
}

impl CountyIndex {
    /// Builds an index from the polygon features of a collection.
    ///
    /// Features without a `Polygon`/`MultiPolygon` geometry are skipped
    /// with a warning. Unnamed polygons are indexed under an empty name.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Conversion`] if the collection contains no
    /// usable polygons.
    pub fn from_collection(collection: &FeatureCollection) -> Result<Self, GeoError> {
        let entries: Vec<CountyEntry> = collection
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let entry = to_entry(feature);
                if entry.is_none() {
                    log::warn!("Skipping feature {i}: no polygon geometry");
                }
                entry
            })
            .collect();

        let bounds = entries
            .iter()
            .map(|e| envelope_to_bounds(&e.envelope))
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| GeoError::conversion("No polygon features to index"))?;

        log::info!("Loaded {} counties into spatial index", entries.len());

        Ok(Self {
            counties: RTree::bulk_load(entries),
            bounds,
        })
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counties.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counties.size() == 0
    }

    /// Name of the county containing the point.
    ///
    /// Counties tile the state without overlap, so the first match wins.
    #[must_use]
    pub fn lookup(&self, point: LonLat) -> Option<&str> {
        let query = geo::Point::new(point.lon, point.lat);
        let query_env = AABB::from_point([point.lon, point.lat]);

        self.counties
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.polygon.contains(&query))
            .map(|entry| entry.name.as_str())
    }
}

impl Region for CountyIndex {
    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn contains(&self, point: LonLat) -> bool {
        self.lookup(point).is_some()
    }
}

fn to_entry(feature: &Feature) -> Option<CountyEntry> {
    let geometry: geo::Geometry<f64> = feature.geometry.clone()?.try_into().ok()?;
    let polygon = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => return None,
    };
    let rect = polygon.bounding_rect()?;
    let name = feature
        .properties
        .as_ref()
        .and_then(county_name)
        .unwrap_or_default();

    Some(CountyEntry {
        name,
        envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        polygon,
    })
}

fn envelope_to_bounds(envelope: &AABB<[f64; 2]>) -> BoundingBox {
    let [west, south] = envelope.lower();
    let [east, north] = envelope.upper();
    BoundingBox::new(north, south, west, east)
}
