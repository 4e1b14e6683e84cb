use formats::source::LoadError;
use scene::regions::BoundsError;

/// Coarse classification of a [`MapError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was missing or empty.
    Validation,
    /// Unknown region, group or marker, or geometry not (yet) available.
    NotFound,
    Configuration,
    Load,
}

#[derive(Debug)]
pub enum MapError {
    MissingArgument(&'static str),
    RegionNotFound(String),
    GroupNotFound(String),
    MarkerNotFound(usize),
    /// The geometry fetch has not resolved yet.
    GeometryNotLoaded,
    /// The geometry fetch failed; the map stays un-initialized.
    GeometryUnavailable(String),
    Configuration(String),
    Load(LoadError),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::MissingArgument(_) => ErrorKind::Validation,
            MapError::RegionNotFound(_)
            | MapError::GroupNotFound(_)
            | MapError::MarkerNotFound(_)
            | MapError::GeometryNotLoaded
            | MapError::GeometryUnavailable(_) => ErrorKind::NotFound,
            MapError::Configuration(_) => ErrorKind::Configuration,
            MapError::Load(_) => ErrorKind::Load,
        }
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::MissingArgument(what) => write!(f, "missing required argument: {what}"),
            MapError::RegionNotFound(id) => write!(f, "region not found: {id:?}"),
            MapError::GroupNotFound(id) => write!(f, "group not found: {id:?}"),
            MapError::MarkerNotFound(index) => write!(f, "marker not found: #{index}"),
            MapError::GeometryNotLoaded => write!(f, "map geometry has not loaded yet"),
            MapError::GeometryUnavailable(reason) => {
                write!(f, "map geometry is unavailable: {reason}")
            }
            MapError::Configuration(msg) => write!(f, "invalid map configuration: {msg}"),
            MapError::Load(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Load(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoadError> for MapError {
    fn from(err: LoadError) -> Self {
        MapError::Load(err)
    }
}

impl From<BoundsError> for MapError {
    fn from(err: BoundsError) -> Self {
        match err {
            BoundsError::EmptySelection => MapError::MissingArgument("ids"),
            BoundsError::UnknownRegion(id) => MapError::RegionNotFound(id),
        }
    }
}
