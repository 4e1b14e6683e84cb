use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use formats::normalize::{DEFAULT_ID_PROPERTY, EUROPE, NormalizeOptions, normalize};
use formats::source::{FsSource, GeometrySource};
use map::{ChoroplethMap, LoadReport, MapConfig, MapError};
use runtime::surface::RecordingSurface;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "atlas", about = "Choropleth map geometry tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep a set of countries and rewrite their properties to `{ "id": ... }`.
    Normalize(NormalizeArgs),
    /// Print the union bounds of regions in map pixels.
    Bounds(RegionArgs),
    /// Print the zoom transform that frames regions in the viewport.
    Fit(RegionArgs),
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    input: PathBuf,
    /// Defaults to stdout.
    output: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_ID_PROPERTY)]
    id_property: String,
    /// Comma-separated ids to keep (defaults to the European set).
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    keep: Vec<String>,
    /// Keep every feature that has an id.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct RegionArgs {
    /// Normalized GeoJSON path (or http(s) URL with the `http` feature).
    geometry: String,
    #[arg(long, required = true, value_delimiter = ',')]
    ids: Vec<String>,
    /// JSON map configuration merged over the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    max_zoom: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BoundsOutput {
    ids: Vec<String>,
    min: [f64; 2],
    max: [f64; 2],
    center: [f64; 2],
}

#[derive(Debug, Serialize)]
struct FitOutput {
    ids: Vec<String>,
    viewport: [f64; 2],
    max_zoom: f64,
    scale: f64,
    translate: [f64; 2],
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Normalize(args) => cmd_normalize(args).await,
        Command::Bounds(args) => cmd_bounds(args).await,
        Command::Fit(args) => cmd_fit(args).await,
    }
}

async fn cmd_normalize(args: NormalizeArgs) -> Result<(), String> {
    let input = args.input.to_string_lossy();
    let collection = FsSource::new()
        .load(&input)
        .await
        .map_err(|e| e.to_string())?;

    let opts = NormalizeOptions {
        id_property: args.id_property.clone(),
        keep: keep_set(&args.keep, args.all),
    };
    let normalized = normalize(&collection, &opts);
    info!(
        input = %input,
        kept = normalized.features.len(),
        dropped = collection.features.len() - normalized.features.len(),
        "normalized"
    );

    let payload = normalized
        .to_geojson_string()
        .map_err(|e| format!("encode geojson: {e}"))?;
    match &args.output {
        Some(path) => tokio::fs::write(path, payload)
            .await
            .map_err(|e| format!("write {path:?}: {e}"))?,
        None => println!("{payload}"),
    }
    Ok(())
}

async fn cmd_bounds(args: RegionArgs) -> Result<(), String> {
    let map = load_map(&args).await?;
    let bounds = map.bounds_of(&args.ids).map_err(|e| e.to_string())?;
    let center = bounds.center();
    print_json(&BoundsOutput {
        ids: args.ids,
        min: bounds.min,
        max: bounds.max,
        center: [center.x, center.y],
    })
}

async fn cmd_fit(args: RegionArgs) -> Result<(), String> {
    let map = load_map(&args).await?;
    let t = map.fit(&args.ids).map_err(|e| e.to_string())?;
    let viewport = map.viewport();
    print_json(&FitOutput {
        ids: args.ids,
        viewport: [viewport.width(), viewport.height()],
        max_zoom: viewport.max_zoom(),
        scale: t.scale,
        translate: [t.translate_x, t.translate_y],
    })
}

fn keep_set(keep: &[String], all: bool) -> Option<BTreeSet<String>> {
    if all {
        None
    } else if keep.is_empty() {
        Some(EUROPE.iter().map(|id| id.to_string()).collect())
    } else {
        Some(keep.iter().cloned().collect())
    }
}

async fn map_config(args: &RegionArgs) -> Result<MapConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("read {path:?}: {e}"))?;
            MapConfig::from_json_str(&text).map_err(|e| e.to_string())?
        }
        None => MapConfig::default(),
    };
    config.map_path = Some(args.geometry.clone());
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(max_zoom) = args.max_zoom {
        config.max_zoom = max_zoom;
    }
    Ok(config)
}

async fn load_map(args: &RegionArgs) -> Result<ChoroplethMap<RecordingSurface>, String> {
    let config = map_config(args).await?;
    let mut map = ChoroplethMap::new(config, RecordingSurface::new()).map_err(|e| e.to_string())?;
    let report = load_geometry(&mut map, &args.geometry)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        regions = report.ingest.inserted,
        skipped = report.ingest.skipped.len(),
        "geometry ready"
    );
    Ok(map)
}

async fn load_geometry(
    map: &mut ChoroplethMap<RecordingSurface>,
    location: &str,
) -> Result<LoadReport, MapError> {
    if is_remote(location) {
        load_remote(map, location).await
    } else {
        map.load(&FsSource::new()).await
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(feature = "http")]
async fn load_remote(
    map: &mut ChoroplethMap<RecordingSurface>,
    _location: &str,
) -> Result<LoadReport, MapError> {
    map.load(&formats::source::HttpSource::default()).await
}

#[cfg(not(feature = "http"))]
async fn load_remote(
    _map: &mut ChoroplethMap<RecordingSurface>,
    location: &str,
) -> Result<LoadReport, MapError> {
    Err(MapError::Configuration(format!(
        "{location}: built without the `http` feature"
    )))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, is_remote, keep_set};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_comma_separated_ids() {
        let argv = ["atlas", "fit", "map.geo.json", "--ids", "DE,FR", "--width", "600"];
        let cli = Cli::try_parse_from(argv).expect("parse");
        let super::Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.ids, vec!["DE".to_string(), "FR".to_string()]);
        assert_eq!(args.width, Some(600.0));
        assert!(Cli::try_parse_from(["atlas", "bounds", "map.geo.json"]).is_err());
    }

    #[test]
    fn remote_locations_are_urls() {
        assert!(is_remote("https://example.org/map.geo.json"));
        assert!(is_remote("http://localhost:8080/map.geo.json"));
        assert!(!is_remote("./public/map.geo.json"));
    }

    #[test]
    fn keep_defaults_to_europe() {
        let europe = keep_set(&[], false).expect("default set");
        assert!(europe.contains("DE") && europe.contains("IS"));
        assert!(keep_set(&[], true).is_none());
        let custom = keep_set(&["BR".to_string()], false).expect("custom");
        assert_eq!(custom.len(), 1);
    }
}

#[cfg(all(test, not(feature = "http")))]
mod offline_tests {
    use super::{ChoroplethMap, MapConfig, RecordingSurface, load_geometry};
    use map::ErrorKind;

    #[tokio::test]
    async fn remote_geometry_needs_the_http_feature() {
        let url = "https://example.org/map.geo.json";
        let config = MapConfig {
            map_path: Some(url.to_string()),
            ..MapConfig::default()
        };
        let mut atlas = ChoroplethMap::new(config, RecordingSurface::new()).expect("map");
        let err = load_geometry(&mut atlas, url)
            .await
            .expect_err("no http support");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!atlas.is_loaded());
    }
}
