//! Point markers drawn on top of the regions.

use foundation::bounds::Aabb2;
use foundation::math::{Mercator, Vec2};
use runtime::surface::MarkerGlyph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A configured marker. Keys other than `long`/`lat` are carried through to
/// marker events untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub long: f64,
    pub lat: f64,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Marker {
    pub fn new(long: f64, lat: f64) -> Self {
        Self {
            long,
            lat,
            data: Map::new(),
        }
    }
}

/// Shared look of every marker. An `img` switches from circles to images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub color: String,
    pub img: Option<String>,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: "blue".to_string(),
            img: None,
            width: 20.0,
            height: 20.0,
            radius: 2.0,
        }
    }
}

impl MarkerStyle {
    pub fn glyph(&self) -> MarkerGlyph {
        match &self.img {
            Some(href) => MarkerGlyph::Image {
                href: href.clone(),
                width: self.width,
                height: self.height,
            },
            None => MarkerGlyph::Circle {
                radius: self.radius,
                color: self.color.clone(),
            },
        }
    }
}

/// A marker resolved to map space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    /// Index into the configured marker list.
    pub index: usize,
    /// Where the glyph is drawn: the circle center, or an image's top-left corner.
    pub position: Vec2,
    pub hit_box: Aabb2,
}

/// Projects `markers` and lays out their glyphs.
///
/// Images sit on top of their anchor (bottom edge at the projected point).
/// Markers whose location does not project to a finite point are dropped.
pub fn place_markers(
    markers: &[Marker],
    projection: &Mercator,
    style: &MarkerStyle,
) -> Vec<PlacedMarker> {
    let glyph = style.glyph();
    markers
        .iter()
        .enumerate()
        .filter_map(|(index, marker)| {
            let anchor = projection.project(marker.long, marker.lat);
            if !anchor.is_finite() {
                warn!(
                    index,
                    long = marker.long,
                    lat = marker.lat,
                    "skipping marker outside the projection"
                );
                return None;
            }
            let (position, hit_box) = match &glyph {
                MarkerGlyph::Circle { radius, .. } => (
                    anchor,
                    Aabb2::new(
                        [anchor.x - radius, anchor.y - radius],
                        [anchor.x + radius, anchor.y + radius],
                    ),
                ),
                MarkerGlyph::Image { width, height, .. } => {
                    let top_left = Vec2::new(anchor.x, anchor.y - height);
                    (
                        top_left,
                        Aabb2::new([top_left.x, top_left.y], [anchor.x + width, anchor.y]),
                    )
                }
            };
            Some(PlacedMarker {
                index,
                position,
                hit_box,
            })
        })
        .collect()
}

/// Topmost marker whose glyph covers `point` (map space). Later markers are drawn on top.
pub fn pick_marker(placed: &[PlacedMarker], point: Vec2) -> Option<&PlacedMarker> {
    placed.iter().rev().find(|m| m.hit_box.contains_point(point))
}
