use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// One linear ring of a polygon, in `[lon, lat]` order.
pub type Ring = Vec<GeoPoint>;

/// Feature geometry. Only polygonal geometry can become a region; every
/// other GeoJSON geometry is carried as its raw JSON so a rewritten
/// collection keeps it.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    Other { kind: String, raw: Value },
}

impl Geometry {
    pub fn type_name(&self) -> &str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Other { kind, .. } => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Region id: `properties.id`, falling back to the feature-level `id`.
    ///
    /// String and number ids are accepted; anything else (or an empty string)
    /// yields `None`.
    pub fn region_id(&self) -> Option<String> {
        self.property_string("id")
            .or_else(|| self.id.clone())
            .filter(|id| !id.is_empty())
    }

    /// A property rendered as text when it is a string or a number.
    pub fn property_string(&self, key: &str) -> Option<String> {
        match self.properties.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A parsed GeoJSON `FeatureCollection`.
///
/// Top-level members other than `type` and `features` are kept in `foreign`
/// so a rewritten collection can carry them through.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub foreign: Map<String, Value>,
}

#[derive(Debug)]
pub enum FeatureCollectionError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for FeatureCollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureCollectionError::Json(e) => write!(f, "JSON parse error: {e}"),
            FeatureCollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FeatureCollectionError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for FeatureCollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeatureCollectionError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl FeatureCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, FeatureCollectionError> {
        let value: Value = serde_json::from_str(payload).map_err(FeatureCollectionError::Json)?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, FeatureCollectionError> {
        let Value::Object(mut obj) = value else {
            return Err(FeatureCollectionError::NotAFeatureCollection);
        };
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(FeatureCollectionError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(FeatureCollectionError::NotAFeatureCollection);
        }
        obj.remove("type");

        let Some(Value::Array(features_val)) = obj.remove("features") else {
            return Err(FeatureCollectionError::NotAFeatureCollection);
        };

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            features.push(parse_feature(feat_val).map_err(|reason| {
                FeatureCollectionError::InvalidFeature { index, reason }
            })?);
        }

        Ok(Self {
            features,
            foreign: obj,
        })
    }

    /// Semantic round-trip exporter: emits a GeoJSON FeatureCollection.
    /// (Property ordering may differ from the parsed input.)
    pub fn to_geojson_value(&self) -> Value {
        let mut root = self.foreign.clone();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );

        let features: Vec<Value> = self.features.iter().map(feature_to_geojson_value).collect();
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }
}

fn parse_feature(value: &Value) -> Result<Feature, String> {
    let feat_obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;

    let feat_type = feat_obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type".to_string())?;
    if feat_type != "Feature" {
        return Err(format!("unexpected feature type: {feat_type}"));
    }

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = feat_obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    // `"geometry": null` is valid GeoJSON (an unlocated feature).
    let geometry = match feat_obj.get("geometry") {
        None => return Err("feature missing geometry".to_string()),
        Some(Value::Null) => None,
        Some(v) => Some(parse_geometry(v)?),
    };

    Ok(Feature {
        id,
        properties,
        geometry,
    })
}

fn feature_to_geojson_value(feat: &Feature) -> Value {
    let mut fobj = Map::new();
    fobj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = &feat.id {
        fobj.insert("id".to_string(), Value::String(id.clone()));
    }
    fobj.insert(
        "properties".to_string(),
        Value::Object(feat.properties.clone()),
    );
    fobj.insert(
        "geometry".to_string(),
        feat.geometry
            .as_ref()
            .map(geometry_to_geojson_value)
            .unwrap_or(Value::Null),
    );
    Value::Object(fobj)
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    match geom {
        Geometry::Polygon(rings) => json!({
            "type": "Polygon",
            "coordinates": rings_value(rings),
        }),
        Geometry::MultiPolygon(polys) => json!({
            "type": "MultiPolygon",
            "coordinates": polys.iter().map(|rings| rings_value(rings)).collect::<Vec<_>>(),
        }),
        Geometry::Other { raw, .. } => raw.clone(),
    }
}

fn rings_value(rings: &[Ring]) -> Value {
    rings
        .iter()
        .map(|ring| ring.iter().map(|p| json!([p.lon_deg, p.lat_deg])).collect::<Value>())
        .collect()
}

const NON_POLYGONAL: [&str; 5] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "GeometryCollection",
];

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type")?;
    if NON_POLYGONAL.contains(&kind) {
        return Ok(Geometry::Other {
            kind: kind.to_string(),
            raw: value.clone(),
        });
    }
    let coords = value
        .get("coordinates")
        .ok_or_else(|| format!("{kind} missing coordinates"))?;
    match kind {
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(array_of(
            coords,
            "MultiPolygon coordinates",
            parse_polygon,
        )?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    array_of(coords, "polygon", |ring| array_of(ring, "ring", parse_position))
}

fn parse_position(value: &Value) -> Result<GeoPoint, String> {
    let Some([lon, lat, ..]) = value.as_array().map(Vec::as_slice) else {
        return Err("position must be [lon, lat]".to_string());
    };
    match (lon.as_f64(), lat.as_f64()) {
        (Some(lon), Some(lat)) => Ok(GeoPoint::new(lon, lat)),
        _ => Err("position coordinates must be numbers".to_string()),
    }
}

fn array_of<T>(
    value: &Value,
    what: &str,
    item: impl Fn(&Value) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{what} must be an array"))?
        .iter()
        .map(item)
        .collect()
}
