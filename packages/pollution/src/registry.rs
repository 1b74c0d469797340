//! Chemical registry, loaded from TOML definitions embedded at compile time.
//!
//! Each `.toml` file in `packages/pollution/chemicals/` describes one
//! tracked pollutant. Adding a chemical means adding a file and listing it
//! below.

use envrisk_pollution_models::ChemicalConfig;

const CHEMICAL_TOMLS: &[(&str, &str)] = &[
    ("co", include_str!("../chemicals/co.toml")),
    ("so2", include_str!("../chemicals/so2.toml")),
    ("no2", include_str!("../chemicals/no2.toml")),
];

/// Parses a chemical definition.
///
/// # Errors
///
/// Returns the TOML parse error message if the definition is malformed.
pub fn parse_chemical_toml(toml_str: &str) -> Result<ChemicalConfig, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Every registered chemical, in registry order.
///
/// # Panics
///
/// Panics if an embedded definition fails to parse.
#[must_use]
pub fn all_chemicals() -> Vec<ChemicalConfig> {
    CHEMICAL_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_chemical_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a chemical by id (case-insensitive).
#[must_use]
pub fn chemical(id: &str) -> Option<ChemicalConfig> {
    all_chemicals()
        .into_iter()
        .find(|c| c.id.eq_ignore_ascii_case(id))
}
