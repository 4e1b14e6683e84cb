use foundation::ids::RegionId;
use foundation::math::{Mercator, Vec2};
use scene::regions::{ProjectedPath, Region, RegionProperties, RegionStore};
use serde_json::Value;
use tracing::{debug, warn};

use crate::feature_collection::{FeatureCollection, GeoPoint, Geometry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    NoGeometry,
    NotPolygonal(String),
    EmptyGeometry,
    DuplicateId(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "missing properties.id"),
            SkipReason::NoGeometry => write!(f, "null geometry"),
            SkipReason::NotPolygonal(ty) => write!(f, "{ty} geometry is not a region"),
            SkipReason::EmptyGeometry => write!(f, "geometry has no finite vertex"),
            SkipReason::DuplicateId(id) => write!(f, "duplicate region id {id:?}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    /// `(feature index, reason)` in input order.
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Projects every polygonal feature and collects the results into a region store.
///
/// Features that cannot become addressable regions are skipped and reported;
/// for duplicate ids the first feature wins.
pub fn ingest_regions(
    collection: &FeatureCollection,
    projection: &Mercator,
) -> (RegionStore, IngestReport) {
    let mut store = RegionStore::new();
    let mut report = IngestReport::default();

    for (index, feature) in collection.features.iter().enumerate() {
        let outcome = feature
            .region_id()
            .and_then(RegionId::new)
            .ok_or(SkipReason::MissingId)
            .and_then(|id| {
                let geometry = feature.geometry.as_ref().ok_or(SkipReason::NoGeometry)?;
                let path = project_geometry(geometry, projection)?;
                let properties = flatten_properties(&feature.properties);
                Region::new(id, properties, path).ok_or(SkipReason::EmptyGeometry)
            })
            .and_then(|region| {
                store
                    .insert(region)
                    .map_err(|dup| SkipReason::DuplicateId(dup.id().to_string()))
            });

        match outcome {
            Ok(_) => report.inserted += 1,
            Err(reason) => {
                warn!(feature = index, %reason, "skipping feature");
                report.skipped.push((index, reason));
            }
        }
    }

    debug!(
        regions = report.inserted,
        skipped = report.skipped.len(),
        "ingested feature collection"
    );
    (store, report)
}

/// Projects polygonal geometry; other geometry kinds are rejected.
pub fn project_geometry(
    geometry: &Geometry,
    projection: &Mercator,
) -> Result<ProjectedPath, SkipReason> {
    let polygons = match geometry {
        Geometry::Polygon(rings) => vec![project_rings(rings, projection)],
        Geometry::MultiPolygon(polys) => polys
            .iter()
            .map(|rings| project_rings(rings, projection))
            .collect(),
        other => return Err(SkipReason::NotPolygonal(other.type_name().to_string())),
    };
    Ok(ProjectedPath::new(polygons))
}

fn project_rings(rings: &[Vec<GeoPoint>], projection: &Mercator) -> Vec<Vec<Vec2>> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| projection.project(p.lon_deg, p.lat_deg))
                .collect()
        })
        .collect()
}

fn flatten_properties(properties: &serde_json::Map<String, Value>) -> RegionProperties {
    RegionProperties::new(
        properties
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect(),
    )
}
