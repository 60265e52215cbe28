use std::path::PathBuf;
use std::sync::Arc;

use amply_core::CoreConfig;
use amply_core::booking::RouteInfo;
use amply_core::handoff::external_map_url;
use amply_core::route::{MapboxDirections, RouteProvider};
use amply_stations::spatial::haversine_distance;
use amply_stations::{LngLat, Station, StaticStationProvider, StationProvider};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "station-probe",
    author,
    version,
    about = "Inspect station catalogues and driving routes",
    long_about = "Loads a station list exported from the backend and answers the same \
                  questions the station screen asks: which stations are close to a point, \
                  and how far the drive to one of them is.\n\n\
                  Directions use the AMPLY_MAPBOX_ACCESS_TOKEN environment variable."
)]
struct Args {
    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Driving route between two points
    Route {
        /// Start as "lng,lat"
        #[arg(long, value_parser = parse_lng_lat)]
        from: LngLat,

        /// Destination as "lng,lat"
        #[arg(long, value_parser = parse_lng_lat)]
        to: LngLat,
    },

    /// Stations closest to a point
    Nearest {
        /// Station list as JSON (the `data` array of `station/public`)
        #[arg(short, long)]
        input: PathBuf,

        /// Point as "lng,lat"
        #[arg(long, value_parser = parse_lng_lat)]
        at: LngLat,

        /// How many stations to list
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,

        /// Only stations within this many meters
        #[arg(long)]
        radius: Option<f64>,
    },
}

fn parse_lng_lat(s: &str) -> Result<LngLat, String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lng,lat\", got {s:?}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;

    let at = LngLat::new(lng, lat);
    if !at.is_valid() {
        return Err(format!("{s} is not a valid coordinate"));
    }
    Ok(at)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    match args.command {
        Command::Route { from, to } => route(from, to).await,
        Command::Nearest {
            input,
            at,
            count,
            radius,
        } => nearest(input, at, count, radius),
    }
}

async fn route(from: LngLat, to: LngLat) -> Result<()> {
    let config = CoreConfig::from_env().context("Failed to read configuration")?;
    let directions = MapboxDirections::new(&config).context("Failed to set up directions")?;

    log::debug!("Request: {}", directions.request_url(from, to)?);

    let summary = directions
        .route(from, to)
        .await
        .with_context(|| format!("No route from {from} to {to}"))?;
    let info = RouteInfo {
        distance_m: summary.distance_m,
        duration_s: summary.duration_s,
    };

    log::info!("Distance: {} km", info.distance_km_label());
    log::info!("Duration: {} min", info.duration_minutes());
    log::info!("Geometry: {} points", summary.geometry.0.len());
    log::info!("Open in maps: {}", external_map_url(from, to));
    Ok(())
}

fn nearest(input: PathBuf, at: LngLat, count: usize, radius: Option<f64>) -> Result<()> {
    if !input.exists() {
        bail!("Input file does not exist: {}", input.display());
    }

    let json = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let stations: Vec<Station> =
        serde_json::from_str(&json).context("Failed to parse station list")?;
    let provider = StaticStationProvider::from_stations(stations);
    log::info!("Loaded {} stations from {}", provider.len(), input.display());

    let point = at.to_point();
    let found = closest(&provider, at, count, radius);

    if found.is_empty() {
        log::warn!("No stations found near {at}");
        return Ok(());
    }

    for station in found {
        log::info!(
            "{:>8.0} m  {:<11} {} ({})",
            haversine_distance(point, station.location()),
            station.status.as_str(),
            station.name,
            station.id,
        );
    }
    Ok(())
}

/// The `count` stations closest to `at`, optionally limited to `radius` meters.
fn closest(
    provider: &StaticStationProvider,
    at: LngLat,
    count: usize,
    radius: Option<f64>,
) -> Vec<Arc<Station>> {
    let point = at.to_point();
    match radius {
        Some(radius) => {
            let mut near = provider.stations_near(point, radius);
            near.truncate(count);
            near
        }
        None => provider.nearest_stations(point, count),
    }
}
