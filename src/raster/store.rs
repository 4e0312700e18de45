use tracing::trace;

use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::progress::{report, ProgressFn};
use crate::raster::{GdalDataType, Strides, StridedRequest, Window};

/// A multi-band raster that can move windows of pixels in and out of caller memory.
///
/// Implementors own the storage, block cache and any resampling; the
/// [`RasterIo`](crate::raster::RasterIo) engine only validates requests and
/// resolves layouts before calling in here. Band indices are 1-based.
pub trait RasterStore {
    /// Raster extent as (cols, rows).
    fn raster_size(&self) -> (usize, usize);

    /// Number of bands.
    fn raster_count(&self) -> usize;

    /// Native element type of band `band_index`.
    fn band_type(&self, band_index: usize) -> Result<GdalDataType>;

    /// Natural block size (cols, rows) of the store. Defaults to one scanline.
    fn block_size(&self) -> (usize, usize) {
        (self.raster_size().0, 1)
    }

    /// Files that make up the raster, if it is file backed.
    fn file_list(&self) -> Vec<String> {
        Vec::new()
    }

    /// Copies `request.window` of the selected bands into `buffer`.
    ///
    /// Implementations must reject out-of-bounds windows, invalid band indices
    /// and buffers shorter than [`StridedRequest::required_len`].
    fn read_strided(&self, request: &StridedRequest<'_>, buffer: &mut [u8]) -> Result<()>;

    /// Copies `buffer` into `request.window` of the selected bands.
    fn write_strided(&mut self, request: &StridedRequest<'_>, buffer: &[u8]) -> Result<()>;

    /// Hint that a read of the described region is coming. Must not block on the data.
    fn advise_read(
        &self,
        _window: Window,
        _buffer_size: (usize, usize),
        _data_type: GdalDataType,
        _bands: &[usize],
        _options: &CslStringList,
    ) -> Result<()> {
        Ok(())
    }

    /// Copies every band of the whole raster into `dst`, chunk by chunk.
    ///
    /// Chunks are runs of rows as tall as this store's block height.
    /// `INTERLEAVE=BAND` copies one band at a time; otherwise each chunk moves
    /// all bands at once. Progress is reported before the first chunk and after
    /// each one.
    fn copy_whole_raster_into<D>(
        &self,
        dst: &mut D,
        options: &CslStringList,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()>
    where
        Self: Sized,
        D: RasterStore + ?Sized,
    {
        let mut progress = progress;
        let (cols, rows) = self.raster_size();
        let band_count = self.raster_count();
        let chunk_rows = self.block_size().1.clamp(1, rows.max(1));
        let chunks = rows.div_ceil(chunk_rows);

        let by_band = options
            .fetch_name_value("INTERLEAVE")
            .is_some_and(|v| v.eq_ignore_ascii_case("BAND"));
        let all_bands: Vec<usize> = (1..=band_count).collect();
        let units: Vec<&[usize]> = if by_band {
            all_bands.chunks(1).collect()
        } else {
            vec![all_bands.as_slice()]
        };
        let total = (units.len() * chunks).max(1);

        report(&mut progress, 0.0, "")?;
        if band_count == 0 || cols == 0 || rows == 0 {
            return report(&mut progress, 1.0, "");
        }
        let mut done = 0;
        for bands in units {
            let data_type = common_type(self, bands)?;
            for chunk in 0..chunks {
                let y_off = chunk * chunk_rows;
                let window = Window::new(0, y_off, cols, chunk_rows.min(rows - y_off));
                let request = StridedRequest {
                    window,
                    buffer_size: window.size(),
                    data_type,
                    bands,
                    strides: Strides::packed(data_type, window.size())?,
                };
                let mut scratch = vec![0u8; request.required_len().unwrap_or(0)];
                self.read_strided(&request, &mut scratch)?;
                dst.write_strided(&request, &scratch)?;

                done += 1;
                trace!(y_off, rows = window.height, bands = bands.len(), "copied chunk");
                report(&mut progress, done as f64 / total as f64, "")?;
            }
        }
        Ok(())
    }
}

/// The type a multi-band chunk travels in: the shared band type, or `Float64`
/// when bands disagree (every supported type converts to it losslessly).
fn common_type<S: RasterStore + ?Sized>(store: &S, bands: &[usize]) -> Result<GdalDataType> {
    let mut types = bands.iter().map(|&b| store.band_type(b));
    let first = match types.next() {
        Some(t) => t?,
        None => return Err(GdalError::BadArgument("no bands to copy".to_string())),
    };
    for t in types {
        if t? != first {
            return Ok(GdalDataType::Float64);
        }
    }
    Ok(first)
}
