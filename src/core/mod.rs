//! Core pipeline stages: footprint projection, chip writing, batch driver.

pub mod chip;
pub mod extract;
pub mod project;

// Re-export main types
pub use chip::ChipWriter;
pub use extract::{extract_buildings, extract_image_pair, ChipOutcome};
pub use project::{geo_bounds, pixel_window, GeoBounds};
