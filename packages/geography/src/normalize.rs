//! County name resolution and normalization.
//!
//! Boundary datasets disagree on which attribute carries the county name
//! (`CNTY` in the WA DNR cadastre, `JURNM` in jurisdiction layers, `NAME`
//! in Census extracts), and scenario responses say `"King County"` where
//! boundaries say `"KING"`. Names are looked up through [`NAME_FIELDS`]
//! in order and compared after [`normalize_name`].

use geojson::JsonObject;

/// Property names that may hold a county name, most specific first.
pub const NAME_FIELDS: &[&str] = &["CNTY", "JURNM", "COUNTY", "COUNTY_NAME", "NAME"];

/// Normalizes a county name for matching: uppercase, every `" COUNTY"`
/// removed, surrounding whitespace trimmed.
///
/// Punctuation and diacritics are left alone.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase().replace(" COUNTY", "").trim().to_string()
}

/// Returns the first non-empty name found under [`NAME_FIELDS`].
///
/// Numeric values are accepted and rendered as text.
#[must_use]
pub fn county_name(properties: &JsonObject) -> Option<String> {
    NAME_FIELDS
        .iter()
        .find_map(|field| match properties.get(*field)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: &serde_json::Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn strips_county_suffix_and_case() {
        assert_eq!(normalize_name("King County"), "KING");
        assert_eq!(normalize_name("  king  "), "KING");
        assert_eq!(normalize_name("KING"), "KING");
        assert_eq!(normalize_name("Grays Harbor County"), "GRAYS HARBOR");
    }

    #[test]
    fn leaves_punctuation_alone() {
        assert_eq!(normalize_name("St. Louis County"), "ST. LOUIS");
    }

    #[test]
    fn name_fields_are_tried_in_order() {
        assert_eq!(
            county_name(&props(&json!({ "NAME": "Pierce", "CNTY": "King" }))),
            Some("King".to_string())
        );
        assert_eq!(
            county_name(&props(&json!({ "NAME": "Pierce", "JURNM": "" }))),
            Some("Pierce".to_string())
        );
        assert_eq!(
            county_name(&props(&json!({ "COUNTY_NAME": "Spokane County" }))),
            Some("Spokane County".to_string())
        );
    }

    #[test]
    fn missing_name_fields() {
        assert_eq!(county_name(&props(&json!({ "OBJECTID": 4 }))), None);
        assert_eq!(county_name(&props(&json!({ "CNTY": null }))), None);
    }

    #[test]
    fn numeric_names_are_rendered() {
        assert_eq!(
            county_name(&props(&json!({ "COUNTY": 33 }))),
            Some("33".to_string())
        );
    }
}
