use foundation::math::Vec2;
use foundation::viewport::ZoomTransform;

use crate::regions::{Region, RegionStore};

/// Region under a map-space point.
///
/// Ordering contract:
/// - Regions drawn later sit on top, so the last region (in insertion order)
///   containing the point wins.
/// - Bounds are checked before the polygon test.
pub fn pick_region(store: &RegionStore, point: Vec2) -> Option<&Region> {
    store
        .iter()
        .rev()
        .filter(|r| r.bounds().contains_point(point))
        .find(|r| r.path().contains(point))
}

/// Screen picking wrapper: undoes the current zoom before testing.
pub fn pick_screen<'a>(
    store: &'a RegionStore,
    screen: Vec2,
    transform: &ZoomTransform,
) -> Option<&'a Region> {
    pick_region(store, transform.invert(screen))
}
