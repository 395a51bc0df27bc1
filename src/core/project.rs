use crate::types::{ChipError, ChipResult, GeoTransform, PixelWindow};
use gdal::vector::Geometry;
use gdal_sys::OGREnvelope;

/// Geographic axis-aligned bounding box of a footprint polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl From<OGREnvelope> for GeoBounds {
    fn from(envelope: OGREnvelope) -> Self {
        GeoBounds {
            min_x: envelope.MinX,
            min_y: envelope.MinY,
            max_x: envelope.MaxX,
            max_y: envelope.MaxY,
        }
    }
}

/// Parse a WKT polygon and compute its geographic bounding box.
///
/// Parsing is delegated to OGR. A malformed string fails this footprint
/// only; the caller keeps the batch going.
pub fn geo_bounds(wkt: &str) -> ChipResult<GeoBounds> {
    let geometry = Geometry::from_wkt(wkt)
        .map_err(|e| ChipError::InvalidWkt(format!("{}: {}", e, wkt)))?;
    Ok(geometry.envelope().into())
}

/// Project a geographic bounding box into an integer pixel window.
///
/// The geographic top-left corner `(min_x, max_y)` and bottom-right corner
/// `(max_x, min_y)` go through the inverse affine, the float coordinates are
/// truncated toward zero, and the result is clamped to
/// `[0, image_width] x [0, image_height]`. A footprint partly or wholly
/// outside the image clips down, possibly to a zero-area window; callers
/// check `PixelWindow::is_empty` and skip those.
pub fn pixel_window(
    bounds: &GeoBounds,
    transform: &GeoTransform,
    image_width: usize,
    image_height: usize,
) -> ChipResult<PixelWindow> {
    let (col_start, row_start) = transform.geo_to_pixel(bounds.min_x, bounds.max_y)?;
    let (col_end, row_end) = transform.geo_to_pixel(bounds.max_x, bounds.min_y)?;

    let clamp = |value: f64, upper: usize| (value as i64).clamp(0, upper as i64) as usize;

    let col_min = clamp(col_start, image_width);
    let row_min = clamp(row_start, image_height);
    // An inverted extent (possible under rotation terms) collapses to empty.
    let col_max = clamp(col_end, image_width).max(col_min);
    let row_max = clamp(row_end, image_height).max(row_min);

    Ok(PixelWindow {
        col_min,
        row_min,
        col_max,
        row_max,
    })
}
