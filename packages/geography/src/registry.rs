//! Compile-time registry of boundary data sources.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a dataset means creating a TOML file in `sources/` and adding a
//! corresponding entry here.

use envrisk_geography_models::BoundarySource;

/// Embedded TOML source definitions.
const SOURCE_TOMLS: &[(&str, &str)] = &[("wa_counties", include_str!("../sources/wa_counties.toml"))];

/// Id of the source used when none is configured.
pub const DEFAULT_SOURCE_ID: &str = "wa_counties";

/// Returns all registered boundary sources.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse.
#[must_use]
pub fn all_sources() -> Vec<BoundarySource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse boundary source '{name}': {e}"))
        })
        .collect()
}

/// Looks up a source by id.
#[must_use]
pub fn source(id: &str) -> Option<BoundarySource> {
    all_sources().into_iter().find(|s| s.id == id)
}
