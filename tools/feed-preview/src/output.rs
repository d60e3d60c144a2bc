use anyhow::{Context, Result};
use geojson::{FeatureCollection, GeoJson};
use inspector_map::layers::viewport::ViewportRequest;
use std::path::Path;

/// Write `data` to `path`, attaching the requested viewport as the
/// collection's `bbox` so viewers can frame it the same way.
pub fn write_vehicle_geojson(
    data: Option<&GeoJson>,
    viewport: Option<&ViewportRequest>,
    path: &Path,
) -> Result<usize> {
    let mut collection = match data {
        Some(GeoJson::FeatureCollection(collection)) => collection.clone(),
        _ => FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        },
    };
    collection.bbox = viewport.map(|request| request.to_bbox().to_vec());
    let count = collection.features.len();

    let json = serde_json::to_string_pretty(&GeoJson::FeatureCollection(collection))
        .context("Failed to serialize GeoJSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))?;

    Ok(count)
}
