//! Asynchronous geometry sources.
//!
//! A source turns a configured map path into a parsed [`FeatureCollection`].
//! Sources never retry; failures are returned to the caller as [`LoadError`].

use std::future::Future;
use std::path::PathBuf;

use tracing::debug;

use crate::feature_collection::{FeatureCollection, FeatureCollectionError};

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Http {
        url: String,
        reason: String,
    },
    Parse {
        path: String,
        source: FeatureCollectionError,
    },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            LoadError::Http { url, reason } => write!(f, "failed to fetch {url}: {reason}"),
            LoadError::Parse { path, source } => write!(f, "failed to parse {path}: {source}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse { source, .. } => Some(source),
            LoadError::Http { .. } => None,
        }
    }
}

/// Capability to fetch a feature collection by path or URL.
pub trait GeometrySource {
    fn load(&self, path: &str) -> impl Future<Output = Result<FeatureCollection, LoadError>>;
}

fn parse(path: &str, payload: &str) -> Result<FeatureCollection, LoadError> {
    FeatureCollection::from_geojson_str(payload).map_err(|source| LoadError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Serves one in-memory payload regardless of the requested path.
#[derive(Debug, Clone)]
pub struct InlineSource {
    payload: String,
}

impl InlineSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl GeometrySource for InlineSource {
    async fn load(&self, path: &str) -> Result<FeatureCollection, LoadError> {
        parse(path, &self.payload)
    }
}

/// Reads collections from the filesystem, resolving relative paths against `root`.
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    root: Option<PathBuf>,
}

impl FsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl GeometrySource for FsSource {
    async fn load(&self, path: &str) -> Result<FeatureCollection, LoadError> {
        let resolved = self.resolve(path);
        debug!(path = %resolved.display(), "reading geometry");
        let payload = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|source| LoadError::Io {
                path: resolved.clone(),
                source,
            })?;
        parse(path, &payload)
    }
}

/// Fetches collections over HTTP(S), resolving relative paths against `base_url`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn resolve(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) if !path.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches("./").trim_start_matches('/')
            ),
            _ => path.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl GeometrySource for HttpSource {
    async fn load(&self, path: &str) -> Result<FeatureCollection, LoadError> {
        let url = self.resolve(path);
        debug!(%url, "fetching geometry");
        let http_err = |e: reqwest::Error| LoadError::Http {
            url: url.clone(),
            reason: e.to_string(),
        };
        let payload = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_err)?
            .text()
            .await
            .map_err(http_err)?;
        parse(&url, &payload)
    }
}
