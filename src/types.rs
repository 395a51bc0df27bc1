use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Geospatial transformation parameters, in GDAL coefficient order
/// `[top_left_x, pixel_width, rotation_x, top_left_y, rotation_y, pixel_height]`.
///
/// The forward map sends pixel `(col, row)` to geographic `(lon, lat)`;
/// `geo_to_pixel` applies the algebraic inverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from a GDAL-ordered coefficient array, the layout used by both
    /// GDAL datasets and the geotransform table file.
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        GeoTransform {
            top_left_x: coefficients[0],
            pixel_width: coefficients[1],
            rotation_x: coefficients[2],
            top_left_y: coefficients[3],
            rotation_y: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// Coefficients back in GDAL order, for `Dataset::set_geo_transform`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Determinant of the 2x2 linear part. Zero means the transform cannot
    /// be inverted (degenerate pixel scale).
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y
    }

    /// Forward map: pixel `(col, row)` to geographic `(lon, lat)`.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let lon = self.top_left_x + self.pixel_width * col + self.rotation_x * row;
        let lat = self.top_left_y + self.rotation_y * col + self.pixel_height * row;
        (lon, lat)
    }

    /// Inverse map: geographic `(lon, lat)` to float pixel `(col, row)`.
    pub fn geo_to_pixel(&self, lon: f64, lat: f64) -> ChipResult<(f64, f64)> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return Err(ChipError::DegenerateTransform(format!(
                "determinant {} too close to zero",
                det
            )));
        }
        let dx = lon - self.top_left_x;
        let dy = lat - self.top_left_y;
        let col = (self.pixel_height * dx - self.rotation_x * dy) / det;
        let row = (self.pixel_width * dy - self.rotation_y * dx) / det;
        Ok((col, row))
    }

    /// Same transform with the origin re-anchored to pixel `(col, row)` of
    /// the source image, so a crop starting there is georeferenced correctly.
    pub fn shifted_to(&self, col: f64, row: f64) -> GeoTransform {
        let (lon, lat) = self.pixel_to_geo(col, row);
        GeoTransform {
            top_left_x: lon,
            top_left_y: lat,
            ..*self
        }
    }
}

/// Integer pixel rectangle in raster space, half-open on both axes:
/// columns `[col_min, col_max)`, rows `[row_min, row_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col_min: usize,
    pub row_min: usize,
    pub col_max: usize,
    pub row_max: usize,
}

impl PixelWindow {
    pub fn width(&self) -> usize {
        self.col_max - self.col_min
    }

    pub fn height(&self) -> usize {
        self.row_max - self.row_min
    }

    /// A window that clipped down to zero area. Degenerate windows are
    /// skipped rather than written as empty files.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// GDAL-style read offset `(x, y)`.
    pub fn offset(&self) -> (isize, isize) {
        (self.col_min as isize, self.row_min as isize)
    }

    /// GDAL-style read size `(x, y)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// Damage classification assigned to a post-disaster building footprint.
///
/// The wire strings (and the per-class output directory names) use the
/// hyphenated spellings from the labeling format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageClass {
    #[serde(rename = "no-damage")]
    NoDamage,
    #[serde(rename = "minor-damage")]
    MinorDamage,
    #[serde(rename = "major-damage")]
    MajorDamage,
    #[serde(rename = "destroyed")]
    Destroyed,
    #[serde(rename = "un-classified")]
    Unclassified,
}

impl DamageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageClass::NoDamage => "no-damage",
            DamageClass::MinorDamage => "minor-damage",
            DamageClass::MajorDamage => "major-damage",
            DamageClass::Destroyed => "destroyed",
            DamageClass::Unclassified => "un-classified",
        }
    }
}

impl std::fmt::Display for DamageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DamageClass {
    type Err = ChipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-damage" => Ok(DamageClass::NoDamage),
            "minor-damage" => Ok(DamageClass::MinorDamage),
            "major-damage" => Ok(DamageClass::MajorDamage),
            "destroyed" => Ok(DamageClass::Destroyed),
            "un-classified" => Ok(DamageClass::Unclassified),
            other => Err(ChipError::UnknownDamageClass(other.to_string())),
        }
    }
}

/// Which image of a disaster pair is being processed. Controls the
/// `<image_type>` path component and the chip naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePhase {
    PreDisaster,
    PostDisaster,
}

impl ImagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImagePhase::PreDisaster => "pre-disaster",
            ImagePhase::PostDisaster => "post-disaster",
        }
    }
}

impl std::fmt::Display for ImagePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs for one extraction run, one image of a disaster pair.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Georeferenced source raster (3 RGB bands expected).
    pub image_path: PathBuf,
    /// Footprint collection matching the image.
    pub footprint_json_path: PathBuf,
    /// Root of the chip directory tree.
    pub output_dir: PathBuf,
    /// Shared table mapping image basename to geotransform coefficients.
    pub geotransform_table_path: PathBuf,
    pub phase: ImagePhase,
}

/// One footprint that could not be processed. The batch continues past it.
#[derive(Debug, Clone)]
pub struct ChipFailure {
    /// Position of the footprint in the parsed collection.
    pub index: usize,
    pub uid: Option<String>,
    pub reason: String,
}

/// Aggregated outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionSummary {
    pub chips_written: usize,
    /// Footprints whose bounding box clipped to a zero-area window.
    pub empty_skipped: usize,
    pub failures: Vec<ChipFailure>,
}

impl ExtractionSummary {
    pub fn processed(&self) -> usize {
        self.chips_written + self.empty_skipped + self.failures.len()
    }
}

/// Error types for chip extraction
#[derive(Debug, thiserror::Error)]
pub enum ChipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid WKT geometry: {0}")]
    InvalidWkt(String),

    #[error("Geotransform not found for image: {0}")]
    MissingGeotransform(String),

    #[error("Degenerate geotransform: {0}")]
    DegenerateTransform(String),

    #[error("Unknown damage classification: {0}")]
    UnknownDamageClass(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unsupported raster: {0}")]
    UnsupportedRaster(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for chip extraction operations.
pub type ChipResult<T> = Result<T, ChipError>;
