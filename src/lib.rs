//! chipper: per-building chip extraction from georeferenced disaster imagery
//!
//! Given a satellite image, a collection of building footprints (WKT
//! polygons in lon/lat) and a per-image affine geotransform table, this
//! library cuts one small georeferenced PNG chip per building and sorts
//! post-disaster chips into folders by damage classification.
//!
//! The pipeline is a single synchronous pass per image: resolve the
//! geotransform, open the raster, project each footprint's bounding box into
//! pixel space, crop the RGB block, and write it out. Raster and geometry
//! I/O are delegated to GDAL.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    ChipError, ChipFailure, ChipResult, DamageClass, ExtractionConfig, ExtractionSummary,
    GeoTransform, ImagePhase, PixelWindow,
};

pub use crate::core::{extract_buildings, extract_image_pair, ChipWriter};
pub use io::{Footprint, FootprintCollection, GeotransformTable};
