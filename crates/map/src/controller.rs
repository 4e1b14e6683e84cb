use foundation::bounds::Aabb2;
use foundation::viewport::{Viewport, ZoomTransform};
use runtime::surface::{RenderSurface, Transition};
use scene::regions::{BoundsError, RegionStore};
use tracing::debug;

use crate::fit::fit;

/// Owns the current zoom transform and is the only caller of
/// [`RenderSurface::apply_zoom`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    viewport: Viewport,
    transform: ZoomTransform,
}

impl ViewportController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            transform: ZoomTransform::IDENTITY,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Last requested transform. Transitions are fire-and-forget, so this is
    /// the target even while the surface is still animating towards it.
    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Frames the union bounds of `ids`.
    pub fn frame_regions<S, I>(
        &mut self,
        surface: &mut S,
        regions: &RegionStore,
        ids: &[I],
        transition: Transition,
    ) -> Result<ZoomTransform, BoundsError>
    where
        S: RenderSurface + ?Sized,
        I: AsRef<str>,
    {
        let bounds = regions.bounds_of(ids)?;
        Ok(self.frame(surface, &bounds, transition))
    }

    pub fn frame<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        bounds: &Aabb2,
        transition: Transition,
    ) -> ZoomTransform {
        let transform = fit(bounds, &self.viewport);
        self.apply(surface, transform, transition);
        transform
    }

    pub fn reset<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, transition: Transition) {
        self.apply(surface, ZoomTransform::IDENTITY, transition);
    }

    fn apply<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        transform: ZoomTransform,
        transition: Transition,
    ) {
        debug!(
            scale = transform.scale,
            tx = transform.translate_x,
            ty = transform.translate_y,
            duration_ms = transition.duration_ms,
            "apply zoom"
        );
        self.transform = transform;
        surface.apply_zoom(transform, transition);
    }
}
