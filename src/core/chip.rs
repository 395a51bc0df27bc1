use crate::types::{ChipError, ChipResult, GeoTransform, PixelWindow};
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::{s, Array2, Array3};
use std::path::{Path, PathBuf};

/// Fixed 1-based band indices for the red, green and blue planes.
pub const RGB_BANDS: [isize; 3] = [1, 2, 3];

/// Reads pixel blocks out of a source raster and writes them back out as
/// small georeferenced PNG chips.
pub struct ChipWriter;

impl ChipWriter {
    /// Read the 3-band RGB block for a pixel window from an open dataset.
    ///
    /// Returns the block as `(band, row, col)`. A source with fewer than 3
    /// bands fails the whole image, not just one footprint.
    pub fn read_block(dataset: &Dataset, window: &PixelWindow) -> ChipResult<Array3<u8>> {
        let band_count = dataset.raster_count();
        if band_count < 3 {
            return Err(ChipError::UnsupportedRaster(format!(
                "expected at least 3 raster bands, found {}",
                band_count
            )));
        }

        let (width, height) = window.size();
        let mut block = Array3::<u8>::zeros((RGB_BANDS.len(), height, width));

        for (plane, band_index) in RGB_BANDS.iter().enumerate() {
            let band = dataset.rasterband(*band_index)?;
            let buffer = band.read_as::<u8>(window.offset(), (width, height), (width, height), None)?;
            let plane_data = Array2::from_shape_vec((height, width), buffer.data)
                .map_err(|e| ChipError::Processing(format!("Failed to reshape band block: {}", e)))?;
            block.slice_mut(s![plane, .., ..]).assign(&plane_data);
        }

        Ok(block)
    }

    /// Write a chip block as a 3-band Byte PNG with the given georeferencing.
    ///
    /// GDAL's PNG driver has no Create path, so the chip is staged in a MEM
    /// dataset and copied out.
    pub fn write_png<P: AsRef<Path>>(
        block: &Array3<u8>,
        transform: &GeoTransform,
        spatial_ref: &SpatialRef,
        output_path: P,
    ) -> ChipResult<()> {
        let (bands, height, width) = block.dim();
        if bands != RGB_BANDS.len() {
            return Err(ChipError::Processing(format!(
                "chip block must have {} bands, got {}",
                RGB_BANDS.len(),
                bands
            )));
        }

        let mem_driver = DriverManager::get_driver_by_name("MEM")?;
        let mut staged =
            mem_driver.create_with_band_type::<u8, _>("", width as isize, height as isize, 3)?;
        staged.set_geo_transform(&transform.to_gdal())?;
        staged.set_spatial_ref(spatial_ref)?;

        for (plane, band_index) in RGB_BANDS.iter().enumerate() {
            let plane_data: Vec<u8> = block.slice(s![plane, .., ..]).iter().copied().collect();
            let buffer = Buffer::new((width, height), plane_data);
            let mut band = staged.rasterband(*band_index)?;
            band.write((0, 0), (width, height), &buffer)?;
        }

        let png_driver = DriverManager::get_driver_by_name("PNG")?;
        staged.create_copy(&png_driver, output_path.as_ref(), &[])?;
        log::debug!("Chip written to {}", output_path.as_ref().display());
        Ok(())
    }

    /// Remove the `.aux.xml` statistics sidecar the PNG driver leaves next
    /// to a chip, if present.
    pub fn remove_sidecar<P: AsRef<Path>>(chip_path: P) -> ChipResult<()> {
        let mut sidecar = chip_path.as_ref().as_os_str().to_owned();
        sidecar.push(".aux.xml");
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
            log::debug!("Removed sidecar {}", sidecar.display());
        }
        Ok(())
    }
}
