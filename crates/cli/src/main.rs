//! Riparia CLI - riparian vegetation degradation analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::{LineString, MultiLineString, Polygon};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use riparia_algorithms::degradation::SeverityClass;
use riparia_algorithms::sampling::{coordinate_key, point_id};
use riparia_algorithms::{
    analyze, analyze_batch, AcquisitionMetadata, AnalysisConfig, AnalysisUnit, AreaOfInterest,
    Scene, UnitFailure, UnitResult,
};
use riparia_core::{
    BufferGeometry, FailureKind, GeoTransform, Raster, RiverCenterline, UtmZone, CRS,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "riparia")]
#[command(author, version, about = "Riparian vegetation degradation analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one scene against a river or a site polygon
    Analyze {
        /// Input description (JSON)
        input: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Analyze a list of independent units
    Batch {
        /// JSON array of input descriptions, each with an "id"
        input: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the UTM zone of a WGS84 location
    UtmZone {
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
    },
    /// Print the stable identifier of a WGS84 location
    PointId {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

/// Options shared by the analysis commands
#[derive(clap::Args)]
struct Overrides {
    /// Configuration file (JSON); missing sections keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Report file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Sampling seed for reproducible draws
    #[arg(short, long)]
    seed: Option<u64>,
    /// Maximum points per severity class
    #[arg(short = 'n', long)]
    max_points: Option<usize>,
    /// Emitted classes, comma separated (critical,moderate,healthy)
    #[arg(short, long, value_delimiter = ',')]
    emit: Option<Vec<String>>,
    /// Analysis buffer distance from the river, in meters
    #[arg(short, long)]
    buffer: Option<f64>,
}

// ─── Input description ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct SceneInput {
    /// Row-major index values; null marks a missing cell
    values: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    nodata: Option<f64>,
    /// GDAL-ordered affine coefficients
    transform: [f64; 6],
    #[serde(default)]
    crs: Option<u32>,
    #[serde(default)]
    upstream_crs: Option<u32>,
    #[serde(default)]
    acquisition: AcquisitionMetadata,
}

#[derive(Deserialize)]
struct UnitInput {
    #[serde(default)]
    id: Option<String>,
    scene: SceneInput,
    /// River centerline parts as [lon, lat] vertices
    #[serde(default)]
    river: Option<Vec<Vec<[f64; 2]>>>,
    #[serde(default)]
    river_name: Option<String>,
    /// Site polygon rings as [lon, lat] vertices, exterior first
    #[serde(default)]
    area: Option<Vec<Vec<[f64; 2]>>>,
}

#[derive(Serialize)]
struct Location {
    lon: f64,
    lat: f64,
    zone: u8,
    hemisphere: String,
    epsg: u32,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {} {}", what, path.display()))
}

fn load_config(overrides: &Overrides) -> Result<AnalysisConfig> {
    let mut config = match &overrides.config {
        Some(path) => read_json::<AnalysisConfig>(path, "config")?,
        None => AnalysisConfig::default(),
    };

    if let Some(seed) = overrides.seed {
        config.sampling.seed = Some(seed);
    }
    if let Some(n) = overrides.max_points {
        config.sampling.max_points_per_class = n;
    }
    if let Some(emit) = &overrides.emit {
        config.sampling.emit = emit
            .iter()
            .map(|s| s.parse::<SeverityClass>())
            .collect::<riparia_core::Result<Vec<_>>>()
            .context("Invalid --emit")?;
    }
    if let Some(distance) = overrides.buffer {
        config.buffer.analysis_distance_m = distance;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_raster(scene: &SceneInput) -> Result<Raster<f64>> {
    let rows = scene.values.len();
    let cols = scene.values.first().map_or(0, Vec::len);
    if let Some(bad) = scene.values.iter().position(|r| r.len() != cols) {
        anyhow::bail!("Ragged raster: row {} has {} values, expected {}", bad, scene.values[bad].len(), cols);
    }

    let data = scene
        .values
        .iter()
        .flatten()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let mut raster = Raster::from_vec(data, rows, cols)
        .context("Invalid raster dimensions")?
        .with_transform(GeoTransform::from_gdal(scene.transform));
    if let Some(nodata) = scene.nodata {
        raster = raster.with_nodata(nodata);
    }
    if let Some(epsg) = scene.crs {
        raster = raster.with_crs(CRS::from_epsg(epsg));
    }
    Ok(raster)
}

fn build_unit(input: UnitInput, fallback_id: String) -> Result<AnalysisUnit> {
    let mut scene = Scene::new(build_raster(&input.scene)?).with_acquisition(input.scene.acquisition);
    if let Some(epsg) = input.scene.upstream_crs {
        scene = scene.with_upstream_crs(CRS::from_epsg(epsg));
    }

    let area = match (input.river, input.area) {
        (Some(parts), area) => {
            if area.is_some() {
                warn!("both river and area given; using the river");
            }
            let lines: MultiLineString<f64> = parts.into_iter().map(LineString::from).collect();
            let river = RiverCenterline::new(lines, CRS::wgs84());
            AreaOfInterest::River(match input.river_name {
                Some(name) => river.named(name),
                None => river,
            })
        }
        (None, Some(rings)) => {
            let mut rings = rings.into_iter().map(LineString::from);
            let exterior = rings.next().context("Area polygon has no rings")?;
            let polygon = Polygon::new(exterior, rings.collect());
            AreaOfInterest::Polygon(BufferGeometry::new(polygon, CRS::wgs84()))
        }
        (None, None) => anyhow::bail!("Input needs a \"river\" or an \"area\""),
    };

    Ok(AnalysisUnit {
        id: input.id.unwrap_or(fallback_id),
        scene,
        area,
    })
}

/// Build and analyze every unit; a unit whose description cannot be turned
/// into a scene fails alone as input-unusable, in its original position.
fn run_batch(inputs: Vec<serde_json::Value>, config: &AnalysisConfig) -> Vec<UnitResult> {
    let mut units = Vec::with_capacity(inputs.len());
    let mut unusable = Vec::new();

    for (i, value) in inputs.into_iter().enumerate() {
        let fallback_id = format!("unit-{}", i);
        let unit_id = value
            .get("id")
            .and_then(|v| v.as_str())
            .map_or_else(|| fallback_id.clone(), str::to_string);
        let built = serde_json::from_value::<UnitInput>(value)
            .context("Invalid unit description")
            .and_then(|u| build_unit(u, fallback_id));

        match built {
            Ok(unit) => units.push(unit),
            Err(err) => {
                let message = format!("{:#}", err);
                warn!(unit = %unit_id, error = %message, "unit input unusable");
                unusable.push((
                    i,
                    UnitResult {
                        unit_id,
                        outcome: Err(UnitFailure {
                            kind: FailureKind::InputUnusable,
                            message,
                        }),
                    },
                ));
            }
        }
    }

    let mut results = analyze_batch(&units, config);
    for (i, failure) in unusable {
        results.insert(i, failure);
    }
    results
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            println!("Report saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Single unit ──────────────────────────────────────────────
        Commands::Analyze { input, overrides } => {
            let config = load_config(&overrides)?;
            let unit = build_unit(read_json(&input, "input")?, input.display().to_string())?;

            let pb = spinner("Analyzing...");
            let start = Instant::now();
            let report = analyze(&unit.scene, &unit.area, &config);
            pb.finish_and_clear();
            let report = report.with_context(|| format!("Analysis of {} failed", unit.id))?;

            info!(
                status = ?report.statistics.status,
                points = report.points.len(),
                consistent = report.consistency.passed,
                "Processing time: {:.2?}",
                start.elapsed()
            );
            write_output(&report, overrides.output.as_deref())?;
        }

        // ── Batch ────────────────────────────────────────────────────
        Commands::Batch { input, overrides } => {
            let config = load_config(&overrides)?;
            let inputs: Vec<serde_json::Value> = read_json(&input, "batch input")?;

            let pb = spinner(&format!("Analyzing {} units...", inputs.len()));
            let start = Instant::now();
            let results = run_batch(inputs, &config);
            pb.finish_and_clear();

            let failed = results.iter().filter(|r| r.outcome.is_err()).count();
            info!(
                units = results.len(),
                failed,
                "Processing time: {:.2?}",
                start.elapsed()
            );
            write_output(&results, overrides.output.as_deref())?;
        }

        // ── Lookups ──────────────────────────────────────────────────
        Commands::UtmZone { lon, lat } => {
            let zone = UtmZone::from_lon_lat(lon, lat);
            let location = Location {
                lon,
                lat,
                zone: zone.zone,
                hemisphere: zone.hemisphere.to_string(),
                epsg: zone.epsg(),
            };
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Commands::PointId { lat, lon } => {
            println!("{}  {}", point_id(lat, lon), coordinate_key(lat, lon));
        }
    }

    Ok(())
}
