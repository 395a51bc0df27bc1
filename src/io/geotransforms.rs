use crate::types::{ChipError, ChipResult, GeoTransform};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Shared lookup table mapping an image basename to its geotransform.
///
/// The file is a JSON object of the form
/// `{"<image>.png": [[originX, pixelWidth, rowRotation, originY, colRotation, pixelHeight]]}`;
/// only the first coefficient array per image is used. Loaded once per run,
/// read-only afterwards.
pub struct GeotransformTable {
    entries: HashMap<String, Vec<[f64; 6]>>,
}

impl GeotransformTable {
    /// Load the table from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ChipResult<Self> {
        log::info!(
            "Loading geotransform table from: {}",
            path.as_ref().display()
        );
        let file = File::open(path.as_ref())?;
        let entries: HashMap<String, Vec<[f64; 6]>> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                ChipError::InvalidJson(format!(
                    "geotransform table {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        log::debug!("Geotransform table has {} entries", entries.len());
        Ok(GeotransformTable { entries })
    }

    /// Look up the transform for an image basename. `None` when the image is
    /// absent from the table or carries an empty coefficient list.
    pub fn get(&self, image_name: &str) -> Option<GeoTransform> {
        self.entries
            .get(image_name)
            .and_then(|coefficient_sets| coefficient_sets.first())
            .map(|coefficients| GeoTransform::from_gdal(*coefficients))
    }

    /// Like `get`, but reports the miss as a `MissingGeotransform` error.
    pub fn resolve(&self, image_name: &str) -> ChipResult<GeoTransform> {
        self.get(image_name)
            .ok_or_else(|| ChipError::MissingGeotransform(image_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
