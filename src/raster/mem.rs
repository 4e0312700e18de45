use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::metadata::{Metadata, MetadataDomains};
use crate::raster::{GdalDataType, RasterStore, StridedRequest, Window};

#[derive(Debug, Clone)]
struct MemBand {
    data_type: GdalDataType,
    data: Vec<u8>,
}

impl MemBand {
    fn new(data_type: GdalDataType, pixels: usize) -> Self {
        MemBand {
            data_type,
            data: vec![0; pixels * data_type.bytes()],
        }
    }
}

/// An in-memory raster: one packed, row-major byte plane per band.
///
/// Bands may have different types. Reads and writes convert between the band
/// type and the requested buffer type, and resample with nearest neighbour
/// when the buffer size differs from the window size.
#[derive(Debug, Clone)]
pub struct MemDataset {
    size: (usize, usize),
    block_size: (usize, usize),
    bands: Vec<MemBand>,
    metadata: MetadataDomains,
}

/// Source index along one axis for destination index `i`, mapping `dst_len` samples onto `src_len`.
fn nearest(i: usize, src_len: usize, dst_len: usize) -> usize {
    (((2 * i + 1) * src_len) / (2 * dst_len)).min(src_len - 1)
}

impl MemDataset {
    /// Creates a raster of `size` (cols, rows) with `band_count` zeroed bands of `data_type`.
    pub fn new(size: (usize, usize), band_count: usize, data_type: GdalDataType) -> Self {
        Self::with_band_types(size, &vec![data_type; band_count])
    }

    /// Creates a raster with one zeroed band per entry of `band_types`.
    pub fn with_band_types(size: (usize, usize), band_types: &[GdalDataType]) -> Self {
        MemDataset {
            size,
            block_size: (size.0, 1),
            bands: band_types
                .iter()
                .map(|&t| MemBand::new(t, size.0 * size.1))
                .collect(),
            metadata: MetadataDomains::new(),
        }
    }

    /// Sets the block size reported to whole-raster copies.
    pub fn with_block_size(mut self, block_size: (usize, usize)) -> Self {
        self.block_size = block_size;
        self
    }

    /// Appends a zeroed band and returns its 1-based index.
    pub fn add_band(&mut self, data_type: GdalDataType) -> usize {
        self.bands
            .push(MemBand::new(data_type, self.size.0 * self.size.1));
        self.bands.len()
    }

    pub fn set_description(&mut self, description: &str) {
        self.metadata.set_description(description);
    }

    /// Raw native-endian bytes of one band.
    pub fn band_bytes(&self, band_index: usize) -> Result<&[u8]> {
        Ok(&self.band(band_index, "band_bytes")?.data)
    }

    fn band(&self, band_index: usize, method_name: &'static str) -> Result<&MemBand> {
        band_index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| GdalError::RasterIo {
                method_name,
                msg: format!(
                    "band {band_index} out of range, dataset has {} bands",
                    self.bands.len()
                ),
            })
    }

    fn check_region(
        &self,
        window: &Window,
        bands: &[usize],
        method_name: &'static str,
    ) -> Result<()> {
        if !window.fits_within(self.size) {
            return Err(GdalError::RasterIo {
                method_name,
                msg: format!(
                    "window {window:?} is outside the {}x{} raster",
                    self.size.0, self.size.1
                ),
            });
        }
        for &band in bands {
            self.band(band, method_name)?;
        }
        Ok(())
    }

    fn check_request(
        &self,
        request: &StridedRequest<'_>,
        buffer_len: usize,
        method_name: &'static str,
    ) -> Result<()> {
        self.check_region(&request.window, request.bands, method_name)?;
        if request.window.is_empty() || request.buffer_size.0 == 0 || request.buffer_size.1 == 0 {
            return Err(GdalError::RasterIo {
                method_name,
                msg: "empty window or buffer".to_string(),
            });
        }
        request
            .check_buffer(buffer_len)
            .map_err(|e| GdalError::RasterIo {
                method_name,
                msg: e.to_string(),
            })
    }
}

impl RasterStore for MemDataset {
    fn raster_size(&self) -> (usize, usize) {
        self.size
    }

    fn raster_count(&self) -> usize {
        self.bands.len()
    }

    fn band_type(&self, band_index: usize) -> Result<GdalDataType> {
        Ok(self.band(band_index, "band_type")?.data_type)
    }

    fn block_size(&self) -> (usize, usize) {
        self.block_size
    }

    fn read_strided(&self, request: &StridedRequest<'_>, buffer: &mut [u8]) -> Result<()> {
        self.check_request(request, buffer.len(), "read_strided")?;
        let window = request.window;
        let (buf_cols, buf_rows) = request.buffer_size;
        let elem = request.data_type.bytes();

        for (pos, &band_index) in request.bands.iter().enumerate() {
            let band = &self.bands[band_index - 1];
            let band_elem = band.data_type.bytes();
            for row in 0..buf_rows {
                let src_row = window.y_off + nearest(row, window.height, buf_rows);
                for col in 0..buf_cols {
                    let src_col = window.x_off + nearest(col, window.width, buf_cols);
                    let src = (src_row * self.size.0 + src_col) * band_elem;
                    let dst = request.offset(pos, col, row);
                    band.data_type.convert_into(
                        &band.data[src..src + band_elem],
                        request.data_type,
                        &mut buffer[dst..dst + elem],
                    );
                }
            }
        }
        Ok(())
    }

    fn write_strided(&mut self, request: &StridedRequest<'_>, buffer: &[u8]) -> Result<()> {
        self.check_request(request, buffer.len(), "write_strided")?;
        let window = request.window;
        let (buf_cols, buf_rows) = request.buffer_size;
        let elem = request.data_type.bytes();
        let raster_cols = self.size.0;

        for (pos, &band_index) in request.bands.iter().enumerate() {
            let band = &mut self.bands[band_index - 1];
            let band_elem = band.data_type.bytes();
            for row in 0..window.height {
                let buf_row = nearest(row, buf_rows, window.height);
                for col in 0..window.width {
                    let buf_col = nearest(col, buf_cols, window.width);
                    let src = request.offset(pos, buf_col, buf_row);
                    let dst = ((window.y_off + row) * raster_cols + window.x_off + col) * band_elem;
                    request.data_type.convert_into(
                        &buffer[src..src + elem],
                        band.data_type,
                        &mut band.data[dst..dst + band_elem],
                    );
                }
            }
        }
        Ok(())
    }

    /// Nothing to prefetch in memory; only checks that the region exists.
    fn advise_read(
        &self,
        window: Window,
        _buffer_size: (usize, usize),
        _data_type: GdalDataType,
        bands: &[usize],
        _options: &CslStringList,
    ) -> Result<()> {
        self.check_region(&window, bands, "advise_read")
    }
}

impl Metadata for MemDataset {
    fn description(&self) -> Result<String> {
        self.metadata.description()
    }

    fn metadata_domains(&self) -> Vec<String> {
        self.metadata.metadata_domains()
    }

    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>> {
        self.metadata.metadata_domain(domain)
    }

    fn set_metadata_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()> {
        self.metadata.set_metadata_item(key, value, domain)
    }

    fn metadata_item(&self, key: &str, domain: &str) -> Option<String> {
        self.metadata.metadata_item(key, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::nearest;

    #[test]
    fn nearest_is_identity_at_equal_size() {
        for i in 0..7 {
            assert_eq!(nearest(i, 7, 7), i);
        }
    }

    #[test]
    fn nearest_downsamples_to_cell_centres() {
        // 4 source samples onto 2: centres fall in samples 1 and 3
        assert_eq!(nearest(0, 4, 2), 1);
        assert_eq!(nearest(1, 4, 2), 3);
        // 2 onto 4 repeats each sample twice
        let up: Vec<_> = (0..4).map(|i| nearest(i, 2, 4)).collect();
        assert_eq!(up, vec![0, 0, 1, 1]);
    }
}
