use anyhow::{bail, Context, Result};
use clap::Parser;
use geo::Coord;
use inspector_map::interaction::FocusEvent;
use inspector_map::{AppState, HeadlessFactory, HeadlessSurface, MapConfig, MapView, SurfaceEvent};
use inspector_transit::{FeedSnapshot, VehicleIdentifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod output;

use output::write_vehicle_geojson;

#[derive(Parser, Debug)]
#[command(
    name = "feed-preview",
    author,
    version,
    about = "Render a GTFS-RT vehicle snapshot through the map view without a display",
    long_about = "Decodes a GTFS-RT feed message in JSON form, runs one reconciliation \
                  pass against an in-memory render surface and writes the vehicle \
                  features the map would draw as GeoJSON.\n\n\
                  With --inspect, also clicks the given vehicle and prints the popup \
                  and the focus events the host would receive."
)]
struct Args {
    /// Input feed snapshot (GTFS-RT FeedMessage as JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Output GeoJSON file for the rendered vehicles
    #[arg(short, long)]
    output: PathBuf,

    /// Map configuration JSON; missing keys use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulate a click on this vehicle id
    #[arg(long)]
    inspect: Option<String>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {what} {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output.display());

    if !args.input.exists() {
        bail!("Input file does not exist: {}", args.input.display());
    }

    let config = match &args.config {
        Some(path) => read_json::<MapConfig>(path, "map config")?,
        None => MapConfig::default(),
    };
    let snapshot: FeedSnapshot = read_json(&args.input, "feed snapshot")?;
    let positioned = snapshot.positioned_vehicles().count();
    log::info!(
        "Decoded {} entities, {} with a position",
        snapshot.entities.len(),
        positioned
    );

    let mut view: MapView<HeadlessSurface> = MapView::new(config);
    view.initialize(&mut HeadlessFactory::default(), "feed-preview")
        .context("Failed to create render surface")?;
    log::debug!("Style: {}", view.config().style);

    let mut events: Vec<FocusEvent> = Vec::new();
    view.handle_event(SurfaceEvent::Load, &mut events);
    view.update(&AppState {
        feed: Some(Arc::new(snapshot.clone())),
        ..Default::default()
    });

    let Some(surface) = view.surface() else {
        bail!("Render surface went away during reconciliation");
    };
    let viewport = surface.camera_requests().last();
    match viewport {
        Some(request) => {
            let [west, south, east, north] = request.to_bbox();
            log::info!(
                "Viewport: [{west:.5}, {south:.5}] - [{east:.5}, {north:.5}], padding {}",
                request.padding
            );
        }
        None => log::warn!("No positioned vehicles; the viewport was left unchanged"),
    }

    let count = write_vehicle_geojson(surface.source("vehicle-positions"), viewport, &args.output)?;
    log::info!("Wrote {} vehicle features to {}", count, args.output.display());

    if let Some(id) = &args.inspect {
        inspect(&mut view, &snapshot, &VehicleIdentifier::new(id), &mut events)?;
    }

    view.teardown();
    Ok(())
}

/// Click on `id` and report what the host would see.
fn inspect(
    view: &mut MapView<HeadlessSurface>,
    snapshot: &FeedSnapshot,
    id: &VehicleIdentifier,
    events: &mut Vec<FocusEvent>,
) -> Result<()> {
    let Some((vehicle, point)) = snapshot
        .positioned_vehicles()
        .find(|(vehicle, _)| vehicle.vehicle_id() == Some(id))
    else {
        bail!("Vehicle {id} has no position in the snapshot");
    };

    match vehicle.trip.as_ref().and_then(|trip| trip.start()) {
        Some(Ok(start)) => log::info!("Trip started {}", start.timestamp()),
        Some(Err(e)) => log::warn!("Trip start not shown: {e}"),
        None => log::debug!("Vehicle {id} reports no trip start"),
    }

    log::info!("Clicking vehicle {id} at ({:.5}, {:.5})", point.x(), point.y());
    events.clear();
    view.handle_event(
        SurfaceEvent::Click {
            lng_lat: Coord {
                x: point.x(),
                y: point.y(),
            },
        },
        events,
    );

    for event in events.iter() {
        println!("{} -> {}", event.name(), event.id().unwrap_or("(none)"));
    }
    if let Some(surface) = view.surface() {
        for (_, popup) in surface.popups() {
            println!("{}", popup.html);
        }
    }

    Ok(())
}
