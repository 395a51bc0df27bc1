//! Input readers for the two JSON documents driving an extraction run.

pub mod footprints;
pub mod geotransforms;

// Re-export main types
pub use footprints::{Footprint, FootprintCollection, FootprintProperties};
pub use geotransforms::GeotransformTable;
