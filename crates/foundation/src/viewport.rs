use crate::math::Vec2;

/// Fixed-size drawing surface and its zoom ceiling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    max_zoom: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ViewportError {
    InvalidSize { width: f64, height: f64 },
    InvalidMaxZoom(f64),
}

impl std::fmt::Display for ViewportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportError::InvalidSize { width, height } => {
                write!(f, "viewport size must be positive: {width}x{height}")
            }
            ViewportError::InvalidMaxZoom(z) => write!(f, "max zoom must be >= 1, got {z}"),
        }
    }
}

impl std::error::Error for ViewportError {}

impl Viewport {
    pub fn new(width: f64, height: f64, max_zoom: f64) -> Result<Self, ViewportError> {
        let size_ok = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
        if !size_ok {
            return Err(ViewportError::InvalidSize { width, height });
        }
        if !(max_zoom.is_finite() && max_zoom >= 1.0) {
            return Err(ViewportError::InvalidMaxZoom(max_zoom));
        }
        Ok(Self {
            width,
            height,
            max_zoom,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Uniform scale followed by a translation: `screen = world * scale + translate`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    /// Maps a point from map pixel space to screen space.
    pub fn apply(&self, p: Vec2) -> Vec2 {
        p * self.scale + self.translate()
    }

    /// Maps a screen point back into map pixel space.
    pub fn invert(&self, p: Vec2) -> Vec2 {
        (p - self.translate()) * (1.0 / self.scale)
    }
}
