//! Box-to-viewport fitting.

use foundation::bounds::Aabb2;
use foundation::viewport::{Viewport, ZoomTransform};

/// Share of the viewport the fitted box may occupy along its tighter axis.
pub const FIT_MARGIN: f64 = 0.9;

/// Zoom transform that centers `bounds` in `viewport` with a margin.
///
/// The scale is clamped to `[1, max_zoom]`: the map never zooms out past its
/// initial extent. A degenerate (point) box zooms all the way in.
pub fn fit(bounds: &Aabb2, viewport: &Viewport) -> ZoomTransform {
    let max_zoom = viewport.max_zoom();
    let dx = bounds.width();
    let dy = bounds.height();
    let candidate = if bounds.is_point() {
        max_zoom
    } else {
        FIT_MARGIN / (dx / viewport.width()).max(dy / viewport.height())
    };
    let scale = if candidate.is_nan() {
        max_zoom
    } else {
        candidate.clamp(1.0, max_zoom)
    };

    let center = bounds.center();
    let target = viewport.center();
    ZoomTransform::new(
        scale,
        target.x - scale * center.x,
        target.y - scale * center.y,
    )
}
