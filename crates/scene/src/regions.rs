use std::collections::BTreeMap;

use foundation::Arena;
use foundation::bounds::Aabb2;
use foundation::ids::RegionId;
use foundation::math::Vec2;

/// Flattened feature properties, kept for event payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionProperties {
    pub pairs: Vec<(String, String)>,
}

impl RegionProperties {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A region's geometry after projection: polygons of rings, outer ring first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPath {
    pub polygons: Vec<Vec<Vec<Vec2>>>,
}

impl ProjectedPath {
    pub fn new(polygons: Vec<Vec<Vec<Vec2>>>) -> Self {
        Self { polygons }
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.polygons.iter().flatten().flatten().copied()
    }

    /// Smallest box covering every projected vertex.
    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.vertices())
    }

    /// Even-odd containment per polygon; holes are inner rings.
    pub fn contains(&self, p: Vec2) -> bool {
        self.polygons.iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_contains(ring, p))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[Vec2], p: Vec2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// A loaded, addressable region. Geometry is immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    properties: RegionProperties,
    path: ProjectedPath,
    bounds: Aabb2,
}

impl Region {
    /// Returns `None` when the path has no finite vertex.
    pub fn new(id: RegionId, properties: RegionProperties, path: ProjectedPath) -> Option<Self> {
        let bounds = path.bounds()?;
        Some(Self {
            id,
            properties,
            path,
            bounds,
        })
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn properties(&self) -> &RegionProperties {
        &self.properties
    }

    pub fn path(&self) -> &ProjectedPath {
        &self.path
    }

    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsError {
    EmptySelection,
    UnknownRegion(String),
}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::EmptySelection => write!(f, "at least one region id is required"),
            BoundsError::UnknownRegion(id) => write!(f, "no region with id {id:?}"),
        }
    }
}

impl std::error::Error for BoundsError {}

/// Immutable collection of loaded regions, addressable by id.
///
/// Ordering contract:
/// - `iter` yields regions in insertion (draw) order.
#[derive(Debug, Default)]
pub struct RegionStore {
    regions: Arena<Region>,
    by_id: BTreeMap<RegionId, usize>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `region`; a duplicate id is rejected and handed back.
    pub fn insert(&mut self, region: Region) -> Result<usize, Region> {
        if self.by_id.contains_key(region.id()) {
            return Err(region);
        }
        let id = region.id().clone();
        let idx = self.regions.alloc(region);
        self.by_id.insert(id, idx);
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.by_id.get(id).and_then(|&idx| self.regions.get(idx))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Region> + '_ {
        self.regions.iter().map(|(_, r)| r)
    }

    /// Union bounding box of the named regions.
    ///
    /// The first region seeds the box; every further region widens it. The
    /// reduction is associative and commutative, so id order never changes
    /// the result.
    pub fn bounds_of<S: AsRef<str>>(&self, ids: &[S]) -> Result<Aabb2, BoundsError> {
        let (first, rest) = ids.split_first().ok_or(BoundsError::EmptySelection)?;
        let seed = self.region_bounds(first.as_ref())?;
        rest.iter().try_fold(seed, |acc, id| {
            Ok(acc.union(self.region_bounds(id.as_ref())?))
        })
    }

    fn region_bounds(&self, id: &str) -> Result<Aabb2, BoundsError> {
        self.get(id)
            .map(Region::bounds)
            .ok_or_else(|| BoundsError::UnknownRegion(id.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{BoundsError, ProjectedPath, Region, RegionProperties, RegionStore};
    use foundation::bounds::Aabb2;
    use foundation::ids::RegionId;
    use foundation::math::Vec2;

    pub(crate) fn square(id: &str, min: [f64; 2], max: [f64; 2]) -> Region {
        let ring = vec![
            Vec2::new(min[0], min[1]),
            Vec2::new(max[0], min[1]),
            Vec2::new(max[0], max[1]),
            Vec2::new(min[0], max[1]),
            Vec2::new(min[0], min[1]),
        ];
        Region::new(
            RegionId::new(id).expect("id"),
            RegionProperties::new(vec![("id".to_string(), id.to_string())]),
            ProjectedPath::new(vec![vec![ring]]),
        )
        .expect("region")
    }

    pub(crate) fn store() -> RegionStore {
        let mut store = RegionStore::new();
        store.insert(square("DE", [400.0, 200.0], [500.0, 300.0])).expect("DE");
        store.insert(square("FR", [300.0, 250.0], [420.0, 380.0])).expect("FR");
        store.insert(square("IT", [450.0, 320.0], [520.0, 450.0])).expect("IT");
        store
    }

    #[test]
    fn single_id_degenerates_to_own_box() {
        let store = store();
        assert_eq!(
            store.bounds_of(&["DE"]),
            Ok(Aabb2::new([400.0, 200.0], [500.0, 300.0]))
        );
    }

    #[test]
    fn bounds_are_order_independent() {
        let store = store();
        let expected = Aabb2::new([300.0, 200.0], [520.0, 450.0]);
        for ids in [
            ["DE", "FR", "IT"],
            ["DE", "IT", "FR"],
            ["FR", "DE", "IT"],
            ["FR", "IT", "DE"],
            ["IT", "DE", "FR"],
            ["IT", "FR", "DE"],
        ] {
            assert_eq!(store.bounds_of(&ids), Ok(expected), "order {ids:?}");
        }
    }

    #[test]
    fn bounds_are_monotonic() {
        let store = store();
        let a = store.bounds_of(&["DE"]).expect("a");
        let b = store.bounds_of(&["FR", "IT"]).expect("b");
        let both = store.bounds_of(&["DE", "FR", "IT"]).expect("both");
        assert!(both.contains(&a));
        assert!(both.contains(&b));
    }

    #[test]
    fn empty_and_unknown_ids_fail() {
        let store = store();
        let none: [&str; 0] = [];
        assert_eq!(store.bounds_of(&none), Err(BoundsError::EmptySelection));
        assert_eq!(
            store.bounds_of(&["DE", "XX"]),
            Err(BoundsError::UnknownRegion("XX".to_string()))
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = store();
        let dup = square("DE", [0.0, 0.0], [1.0, 1.0]);
        assert!(store.insert(dup).is_err());
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.get("DE").map(Region::bounds),
            Some(Aabb2::new([400.0, 200.0], [500.0, 300.0]))
        );
    }

    #[test]
    fn region_without_vertices_is_not_constructed() {
        let region = Region::new(
            RegionId::new("XX").expect("id"),
            RegionProperties::default(),
            ProjectedPath::new(vec![vec![Vec::new()]]),
        );
        assert!(region.is_none());
    }

    #[test]
    fn containment_respects_holes() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let hole = vec![
            Vec2::new(4.0, 4.0),
            Vec2::new(6.0, 4.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(4.0, 6.0),
        ];
        let path = ProjectedPath::new(vec![vec![outer, hole]]);
        assert!(path.contains(Vec2::new(1.0, 1.0)));
        assert!(!path.contains(Vec2::new(5.0, 5.0)));
        assert!(!path.contains(Vec2::new(11.0, 5.0)));
    }

    #[test]
    fn properties_lookup() {
        let props = RegionProperties::new(vec![("name".to_string(), "France".to_string())]);
        assert_eq!(props.get("name"), Some("France"));
        assert_eq!(props.get("id"), None);
    }
}
