use crate::core::chip::ChipWriter;
use crate::core::project::{geo_bounds, pixel_window};
use crate::io::footprints::{Footprint, FootprintCollection};
use crate::io::geotransforms::GeotransformTable;
use crate::types::{
    ChipError, ChipFailure, ChipResult, ExtractionConfig, ExtractionSummary, GeoTransform,
    ImagePhase,
};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome for a single footprint.
#[derive(Debug)]
pub enum ChipOutcome {
    Written(PathBuf),
    /// The footprint's bounding box clipped to a zero-area window.
    SkippedEmpty,
}

/// Extract one chip per building footprint from a georeferenced image.
///
/// The source raster stays open for the duration of the footprint loop and
/// closes on every exit path. A missing geotransform entry aborts this
/// image's extraction with a diagnostic and an empty summary, without
/// failing the caller. Per-footprint errors (bad WKT, missing labels) are
/// collected in the summary and do not abort the batch.
pub fn extract_buildings(config: &ExtractionConfig) -> ChipResult<ExtractionSummary> {
    log::info!(
        "Extracting {} buildings from {}",
        config.phase,
        config.image_path.display()
    );

    let dataset = Dataset::open(&config.image_path)?;
    let (image_width, image_height) = dataset.raster_size();
    log::info!("Image dimensions: {}x{}", image_width, image_height);

    let image_name = config
        .image_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ChipError::Processing(format!(
                "image path has no usable basename: {}",
                config.image_path.display()
            ))
        })?;

    let table = GeotransformTable::from_path(&config.geotransform_table_path)?;
    let transform = match table.resolve(image_name) {
        Ok(transform) => transform,
        // Not fatal to the caller: this image's extraction becomes a no-op.
        Err(ChipError::MissingGeotransform(name)) => {
            log::error!("Geotransform data not found for image {}", name);
            return Ok(ExtractionSummary::default());
        }
        Err(e) => return Err(e),
    };
    log::debug!("Affine transform: {:?}", transform);

    let collection = FootprintCollection::from_path(&config.footprint_json_path)?;

    // Footprints are lon/lat; fall back to WGS84 when the source raster
    // carries no CRS of its own (plain PNGs usually don't).
    let spatial_ref = dataset
        .spatial_ref()
        .or_else(|_| SpatialRef::from_epsg(4326))?;

    let mut summary = ExtractionSummary::default();
    for (index, footprint) in collection.buildings.iter().enumerate() {
        let label = footprint
            .properties
            .uid
            .clone()
            .unwrap_or_else(|| format!("#{}", index + 1));

        match extract_one(
            &dataset,
            footprint,
            index,
            &transform,
            &spatial_ref,
            image_width,
            image_height,
            config,
        ) {
            Ok(ChipOutcome::Written(path)) => {
                summary.chips_written += 1;
                log::info!("Building {} chip saved to {}", label, path.display());
            }
            Ok(ChipOutcome::SkippedEmpty) => {
                summary.empty_skipped += 1;
                log::warn!(
                    "Skipping building {}: footprint clips to an empty window",
                    label
                );
            }
            Err(e) => {
                log::warn!("Building {} failed: {}", label, e);
                summary.failures.push(ChipFailure {
                    index,
                    uid: footprint.properties.uid.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Extraction complete: {} chips written, {} empty windows skipped, {} failures",
        summary.chips_written,
        summary.empty_skipped,
        summary.failures.len()
    );
    Ok(summary)
}

/// Run extraction for a pre/post disaster image pair, pre first.
pub fn extract_image_pair(
    pre: &ExtractionConfig,
    post: &ExtractionConfig,
) -> ChipResult<(ExtractionSummary, ExtractionSummary)> {
    let pre_summary = extract_buildings(pre)?;
    let post_summary = extract_buildings(post)?;
    Ok((pre_summary, post_summary))
}

#[allow(clippy::too_many_arguments)]
fn extract_one(
    dataset: &Dataset,
    footprint: &Footprint,
    index: usize,
    transform: &GeoTransform,
    spatial_ref: &SpatialRef,
    image_width: usize,
    image_height: usize,
    config: &ExtractionConfig,
) -> ChipResult<ChipOutcome> {
    let bounds = geo_bounds(&footprint.wkt)?;
    let window = pixel_window(&bounds, transform, image_width, image_height)?;
    if window.is_empty() {
        return Ok(ChipOutcome::SkippedEmpty);
    }

    let block = ChipWriter::read_block(dataset, &window)?;
    let output_path = chip_path(&config.output_dir, config.phase, index, footprint)?;

    // Re-anchor the georeferencing to the window origin so the chip maps to
    // the ground area it actually covers.
    let chip_transform = transform.shifted_to(window.col_min as f64, window.row_min as f64);
    ChipWriter::write_png(&block, &chip_transform, spatial_ref, &output_path)?;
    ChipWriter::remove_sidecar(&output_path)?;

    Ok(ChipOutcome::Written(output_path))
}

/// Resolve (and create) the output location for one chip.
///
/// Pre-disaster chips are named positionally (1-based index); post-disaster
/// chips go into a per-damage-class subdirectory and are named by their
/// stable uid so re-runs overwrite in place.
fn chip_path(
    output_dir: &Path,
    phase: ImagePhase,
    index: usize,
    footprint: &Footprint,
) -> ChipResult<PathBuf> {
    match phase {
        ImagePhase::PreDisaster => {
            let phase_dir = output_dir.join(phase.as_str());
            fs::create_dir_all(&phase_dir)?;
            Ok(phase_dir.join(format!("building_{}.png", index + 1)))
        }
        ImagePhase::PostDisaster => {
            let damage = footprint.damage_class()?;
            let uid = footprint
                .properties
                .uid
                .as_deref()
                .ok_or_else(|| ChipError::MissingField("properties.uid".to_string()))?;
            let damage_dir = output_dir.join(phase.as_str()).join(damage.as_str());
            fs::create_dir_all(&damage_dir)?;
            Ok(damage_dir.join(format!("building_{}.png", uid)))
        }
    }
}
