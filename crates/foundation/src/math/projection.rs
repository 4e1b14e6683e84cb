//! Spherical Mercator projection from longitude/latitude degrees to pixels.
//!
//! The projection is a pure function of its scale and translate. It is built
//! once from a [`Viewport`] and rebuilt, never mutated, when the viewport
//! changes.

use std::f64::consts::{FRAC_PI_4, TAU};

use super::Vec2;
use crate::bounds::Aabb2;
use crate::viewport::Viewport;

/// Latitude at which the Mercator world becomes square. Inputs beyond it are clamped.
pub const MERCATOR_MAX_LATITUDE_DEG: f64 = 85.051_128_779_806_6;

/// Square the reference geometry is fitted into before scale/translate apply.
pub const REFERENCE_SIZE: [f64; 2] = [500.0, 500.0];

/// Default margin factor applied to the `width / 2π` base scale.
pub const DEFAULT_DAMPING: f64 = 0.9 * 0.9;

/// Vertical placement: the equator sits at `height / VERTICAL_OFFSET_DIVISOR`.
pub const VERTICAL_OFFSET_DIVISOR: f64 = 1.4;

/// The full Mercator world in degrees (x = longitude, y = latitude).
pub const WORLD_LON_LAT: Aabb2 = Aabb2 {
    min: [-180.0, -MERCATOR_MAX_LATITUDE_DEG],
    max: [180.0, MERCATOR_MAX_LATITUDE_DEG],
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: Vec2,
}

impl Default for Mercator {
    fn default() -> Self {
        Self {
            scale: 961.0 / TAU,
            translate: Vec2::new(480.0, 250.0),
        }
    }
}

impl Mercator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map projection for `viewport`.
    ///
    /// `damping` shrinks the `width / 2π` base scale to leave a margin around
    /// the world.
    pub fn for_viewport(viewport: &Viewport, damping: f64) -> Self {
        Self::new()
            .fit_size(REFERENCE_SIZE, WORLD_LON_LAT)
            .with_scale(viewport.width() / TAU * damping)
            .with_translate(Vec2::new(
                viewport.width() / 2.0,
                viewport.height() / VERTICAL_OFFSET_DIVISOR,
            ))
    }

    pub fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    pub fn with_translate(self, translate: Vec2) -> Self {
        Self { translate, ..self }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    /// Unscaled Mercator coordinates (radians), y pointing north.
    pub fn raw(lon_deg: f64, lat_deg: f64) -> Vec2 {
        let lat = lat_deg
            .clamp(-MERCATOR_MAX_LATITUDE_DEG, MERCATOR_MAX_LATITUDE_DEG)
            .to_radians();
        Vec2::new(lon_deg.to_radians(), (FRAC_PI_4 + lat / 2.0).tan().ln())
    }

    /// Projects degrees to pixels, y pointing down.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let r = Self::raw(lon_deg, lat_deg);
        Vec2::new(
            self.translate.x + self.scale * r.x,
            self.translate.y - self.scale * r.y,
        )
    }

    /// Fits `lon_lat` (x = longitude, y = latitude) into a `size` square anchored at the origin.
    ///
    /// Degenerate extents leave the projection unchanged.
    pub fn fit_size(self, size: [f64; 2], lon_lat: Aabb2) -> Self {
        let a = Self::raw(lon_lat.min[0], lon_lat.min[1]);
        let b = Self::raw(lon_lat.max[0], lon_lat.max[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if !(dx > 0.0 && dy > 0.0) {
            return self;
        }
        let k = (size[0] / dx).min(size[1] / dy);
        Self {
            scale: k,
            translate: Vec2::new(
                (size[0] - k * (a.x + b.x)) / 2.0,
                (size[1] + k * (a.y + b.y)) / 2.0,
            ),
        }
    }
}
