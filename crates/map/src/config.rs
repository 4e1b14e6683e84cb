//! Map configuration.
//!
//! Every field is optional in the serialized form; missing keys fall back to
//! [`MapConfig::default`].

use std::collections::BTreeSet;

use foundation::ids::{GroupId, RegionId};
use foundation::math::DEFAULT_DAMPING;
use foundation::viewport::Viewport;
use scene::selection::Group;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::markers::{Marker, MarkerStyle};

/// Accepted range for [`MapConfig::projection_damping`].
pub const DAMPING_RANGE: std::ops::RangeInclusive<f64> = 0.8..=1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: String,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Path or URL handed to the geometry source.
    pub map_path: Option<String>,
    pub width: f64,
    pub height: f64,
    pub max_zoom: f64,
    pub projection_damping: f64,

    pub region_stroke_width: f64,
    pub region_fill_color: String,
    pub region_stroke_color: String,
    pub accent_fill_color: String,
    pub accent_stroke_color: String,
    /// Falls back to the accent fill.
    pub group_fill_color: Option<String>,
    /// Falls back to the accent stroke.
    pub group_stroke_color: Option<String>,

    pub selected_regions: Vec<String>,
    pub zoomed_regions: Vec<String>,
    pub groups: Vec<GroupConfig>,
    pub selected_group: Option<String>,

    pub markers: Vec<Marker>,
    pub marker_style: MarkerStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_path: Some("./public/map.geo.json".to_string()),
            width: 900.0,
            height: 900.0,
            max_zoom: 20.0,
            projection_damping: DEFAULT_DAMPING,
            region_stroke_width: 0.25,
            region_fill_color: "#cccccc".to_string(),
            region_stroke_color: "#ffffff".to_string(),
            accent_fill_color: "red".to_string(),
            accent_stroke_color: "#ffffff".to_string(),
            group_fill_color: None,
            group_stroke_color: None,
            selected_regions: Vec::new(),
            zoomed_regions: Vec::new(),
            groups: Vec::new(),
            selected_group: None,
            markers: Vec::new(),
            marker_style: MarkerStyle::default(),
        }
    }
}

impl MapConfig {
    /// Parses a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        serde_json::from_str(json).map_err(|e| MapError::Configuration(e.to_string()))
    }

    pub fn map_path(&self) -> Result<&str, MapError> {
        match self.map_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(path),
            _ => Err(MapError::Configuration("map_path is required".to_string())),
        }
    }

    pub fn viewport(&self) -> Result<Viewport, MapError> {
        Viewport::new(self.width, self.height, self.max_zoom)
            .map_err(|e| MapError::Configuration(e.to_string()))
    }

    pub fn damping(&self) -> Result<f64, MapError> {
        if DAMPING_RANGE.contains(&self.projection_damping) {
            Ok(self.projection_damping)
        } else {
            Err(MapError::Configuration(format!(
                "projection_damping must be within {}..={}, got {}",
                DAMPING_RANGE.start(),
                DAMPING_RANGE.end(),
                self.projection_damping
            )))
        }
    }

    /// Resolves the configured groups, rejecting empty or repeated group ids
    /// and empty member ids.
    pub fn groups(&self) -> Result<Vec<Group>, MapError> {
        let mut seen = BTreeSet::new();
        self.groups
            .iter()
            .map(|g| {
                let id = GroupId::new(g.id.as_str()).ok_or_else(|| {
                    MapError::Configuration("group id must not be empty".to_string())
                })?;
                if !seen.insert(g.id.as_str()) {
                    return Err(MapError::Configuration(format!("duplicate group id {:?}", g.id)));
                }
                let members = g
                    .regions
                    .iter()
                    .map(|r| {
                        RegionId::new(r.as_str()).ok_or_else(|| {
                            MapError::Configuration(format!(
                                "group {:?} lists an empty region id",
                                g.id
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Group::new(id, members))
            })
            .collect()
    }

    /// Checks every field the map needs before it can be built.
    pub fn validate(&self) -> Result<(), MapError> {
        self.map_path()?;
        self.viewport()?;
        self.damping()?;
        self.groups()?;
        Ok(())
    }
}
