use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::feature_collection::{Feature, FeatureCollection};

/// Property carrying the two-letter country code in Natural Earth exports.
pub const DEFAULT_ID_PROPERTY: &str = "iso_a2_eh";

/// European countries shipped with the default map.
pub const EUROPE: &[&str] = &[
    "FI", "LU", "SE", "NO", "SK", "NL", "EE", "LV", "LT", "BY", "PL", "MD", "RO", "UA", "BG",
    "TR", "GR", "MK", "AL", "XK", "RS", "ME", "BA", "HR", "HU", "SI", "AT", "CZ", "DE", "DK",
    "BE", "GB", "IE", "FR", "CH", "IT", "ES", "PT", "IS",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Source property whose value becomes `properties.id`.
    pub id_property: String,
    /// Ids to keep; `None` keeps every feature that has an id.
    pub keep: Option<BTreeSet<String>>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            keep: None,
        }
    }
}

impl NormalizeOptions {
    pub fn keep_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// Rewrites a raw country collection into the shape the map expects.
///
/// Each kept feature's properties are replaced by `{ "id": <id_property value> }`;
/// geometry, feature ids, and top-level foreign members pass through.
pub fn normalize(collection: &FeatureCollection, opts: &NormalizeOptions) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .filter_map(|feature| {
            let id = feature.property_string(&opts.id_property)?;
            if let Some(keep) = &opts.keep
                && !keep.contains(&id)
            {
                return None;
            }
            let mut properties = Map::new();
            properties.insert("id".to_string(), Value::String(id));
            Some(Feature {
                id: feature.id.clone(),
                properties,
                geometry: feature.geometry.clone(),
            })
        })
        .collect();

    FeatureCollection {
        features,
        foreign: collection.foreign.clone(),
    }
}
