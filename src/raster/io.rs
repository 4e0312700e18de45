use tracing::{debug, warn};

use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::progress::ProgressFn;
use crate::raster::{
    Buffer, BufferLayout, BufferMut, BufferRef, GdalDataType, GdalType, RasterStore,
    StridedRequest, Window,
};

#[cfg(feature = "array")]
use ndarray::Array3;

/// Direction of a raster transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read,
    Write,
}

/// A transfer direction together with the caller memory it moves through.
#[derive(Debug)]
pub enum Transfer<'a> {
    Read(BufferMut<'a>),
    Write(BufferRef<'a>),
}

impl<'a> Transfer<'a> {
    pub fn direction(&self) -> IoDirection {
        match self {
            Transfer::Read(_) => IoDirection::Read,
            Transfer::Write(_) => IoDirection::Write,
        }
    }
}

/// Checks the caller's side of a transfer and resolves it into one strided request.
///
/// Everything except the raw-buffer type inference happens before the store is touched.
fn resolve_request<'b, S: RasterStore + ?Sized>(
    store: &S,
    buffer_type: Option<GdalDataType>,
    window: Window,
    bands: &'b [usize],
    layout: &BufferLayout,
) -> Result<StridedRequest<'b>> {
    if bands.is_empty() {
        return Err(GdalError::BadArgument(
            "band selection must not be empty".to_string(),
        ));
    }
    if bands.contains(&0) {
        return Err(GdalError::BadArgument(format!(
            "band indices are 1-based, got {bands:?}"
        )));
    }
    let band_count = store.raster_count();
    if let Some(&band) = bands.iter().find(|&&b| b > band_count) {
        return Err(GdalError::BadArgument(format!(
            "band {band} out of range, raster has {band_count} bands"
        )));
    }
    if window.is_empty() {
        return Err(GdalError::BadArgument(format!(
            "window {window:?} has no pixels"
        )));
    }
    let buffer_size = layout.buffer_size(&window);
    if buffer_size.0 == 0 || buffer_size.1 == 0 {
        return Err(GdalError::BadArgument(format!(
            "buffer size {buffer_size:?} has no pixels"
        )));
    }

    let data_type = match (buffer_type, layout.data_type) {
        (Some(buffer), Some(requested)) if buffer != requested => {
            return Err(GdalError::DataTypeMismatch { buffer, requested });
        }
        (Some(buffer), _) => buffer,
        (None, Some(requested)) => requested,
        // Raw bytes: the first selected band decides for every band.
        (None, None) => store.band_type(bands[0])?,
    };

    Ok(StridedRequest {
        window,
        buffer_size,
        data_type,
        bands,
        strides: layout.resolve_strides(data_type, &window)?,
    })
}

/// The raster I/O engine, available on every [`RasterStore`].
pub trait RasterIo: RasterStore {
    /// Moves `window` of the selected `bands` between the raster and caller memory.
    ///
    /// # Arguments
    /// * transfer - direction plus the caller's buffer
    /// * window - the window position and size in raster pixels
    /// * bands - 1-based band indices, in buffer order; duplicates allowed
    /// * layout - buffer type, size and strides; zero strides mean packed
    ///
    /// The element type comes from a typed buffer, or from `layout.data_type`
    /// for raw bytes, or else from the first selected band. In that last case a
    /// raster whose bands have different types is still transferred with the
    /// first band's type for all bands.
    ///
    /// If the buffer size differs from the window size the store resamples.
    fn transfer(
        &mut self,
        transfer: Transfer<'_>,
        window: Window,
        bands: &[usize],
        layout: BufferLayout,
    ) -> Result<()> {
        match transfer {
            Transfer::Read(buffer) => self.read_window(window, bands, layout, buffer),
            Transfer::Write(buffer) => self.write_window(window, bands, layout, buffer),
        }
    }

    /// The read half of [`transfer`](RasterIo::transfer).
    fn read_window(
        &self,
        window: Window,
        bands: &[usize],
        layout: BufferLayout,
        mut buffer: BufferMut<'_>,
    ) -> Result<()> {
        let request = resolve_request(self, buffer.data_type(), window, bands, &layout)?;
        debug!(
            direction = ?IoDirection::Read,
            ?window,
            ?bands,
            data_type = %request.data_type,
            strides = ?request.strides,
            "raster transfer"
        );
        self.read_strided(&request, buffer.as_bytes_mut())
    }

    /// The write half of [`transfer`](RasterIo::transfer).
    fn write_window(
        &mut self,
        window: Window,
        bands: &[usize],
        layout: BufferLayout,
        buffer: BufferRef<'_>,
    ) -> Result<()> {
        let request = resolve_request(self, buffer.data_type(), window, bands, &layout)?;
        debug!(
            direction = ?IoDirection::Write,
            ?window,
            ?bands,
            data_type = %request.data_type,
            strides = ?request.strides,
            "raster transfer"
        );
        self.write_strided(&request, buffer.as_bytes())
    }

    /// Reads `window` into raw bytes, packed, at window size, typed like the first band.
    fn basic_read(&self, window: Window, bands: &[usize], buffer: &mut [u8]) -> Result<()> {
        self.read_window(window, bands, BufferLayout::packed(), BufferMut::Raw(buffer))
    }

    /// Writes raw bytes into `window`, packed, at window size, typed like the first band.
    fn basic_write(&mut self, window: Window, bands: &[usize], buffer: &[u8]) -> Result<()> {
        self.write_window(window, bands, BufferLayout::packed(), BufferRef::Raw(buffer))
    }

    /// Hints the store to prefetch a region that is about to be read.
    ///
    /// `buffer_size` defaults to the window size and `data_type` to the first
    /// band's type. Only caller mistakes are returned; a failing hint is logged
    /// and otherwise ignored.
    fn advise_read(
        &self,
        window: Window,
        buffer_size: Option<(usize, usize)>,
        data_type: Option<GdalDataType>,
        bands: &[usize],
        options: &CslStringList,
    ) -> Result<()> {
        let mut layout = BufferLayout::packed();
        layout.size = buffer_size;
        layout.data_type = data_type;
        let request = resolve_request(self, None, window, bands, &layout)?;

        if let Err(e) = RasterStore::advise_read(
            self,
            request.window,
            request.buffer_size,
            request.data_type,
            request.bands,
            options,
        ) {
            warn!(?window, ?bands, error = %e, "advise read failed, continuing");
        }
        Ok(())
    }

    /// Copies the whole raster, all bands, into `dst`, which must have the same
    /// size and band count. `options` go to the store untouched.
    fn copy_whole_raster<D>(
        &self,
        dst: &mut D,
        options: &CslStringList,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()>
    where
        Self: Sized,
        D: RasterStore + ?Sized,
    {
        if self.raster_size() != dst.raster_size() {
            return Err(GdalError::BadArgument(format!(
                "raster sizes differ: {:?} vs {:?}",
                self.raster_size(),
                dst.raster_size()
            )));
        }
        if self.raster_count() != dst.raster_count() {
            return Err(GdalError::BadArgument(format!(
                "band counts differ: {} vs {}",
                self.raster_count(),
                dst.raster_count()
            )));
        }
        debug!(size = ?self.raster_size(), bands = self.raster_count(), "copy whole raster");
        self.copy_whole_raster_into(dst, options, progress)
    }

    /// Reads `window` of `bands` resampled to `size`, packed band after band.
    fn read_as<T: GdalType>(
        &self,
        window: Window,
        bands: &[usize],
        size: (usize, usize),
    ) -> Result<Vec<T>> {
        let len = size
            .0
            .checked_mul(size.1)
            .and_then(|pixels| pixels.checked_mul(bands.len()))
            .ok_or_else(|| {
                GdalError::BadArgument(format!(
                    "{} bands of {}x{} elements overflow the address space",
                    bands.len(),
                    size.0,
                    size.1
                ))
            })?;
        let mut data: Vec<T> = vec![bytemuck::Zeroable::zeroed(); len];
        self.read_window(
            window,
            bands,
            BufferLayout::packed()
                .with_size(size)
                .with_data_type(T::datatype()),
            BufferMut::Raw(bytemuck::cast_slice_mut(&mut data)),
        )?;
        Ok(data)
    }

    /// Read the full band as a 'Buffer<T>'.
    fn read_band_as<T: GdalType>(&self, band_index: usize) -> Result<Buffer<T>> {
        let size = self.raster_size();
        let data = self.read_as::<T>(Window::full(size), &[band_index], size)?;
        Ok(Buffer::new(size, data))
    }

    /// Writes `buffer` into `window` of one band, resampling if their sizes differ.
    fn write_band<T: GdalType>(
        &mut self,
        band_index: usize,
        window: Window,
        buffer: &Buffer<T>,
    ) -> Result<()> {
        self.write_window(
            window,
            &[band_index],
            BufferLayout::packed()
                .with_size(buffer.size)
                .with_data_type(T::datatype()),
            BufferRef::Raw(bytemuck::cast_slice(&buffer.data)),
        )
    }

    #[cfg(feature = "array")]
    /// Read a 'Array3<T>' shaped (bands, rows, cols). T implements 'GdalType'.
    fn read_as_array<T: GdalType>(
        &self,
        window: Window,
        bands: &[usize],
        size: (usize, usize),
    ) -> Result<Array3<T>> {
        let data = self.read_as::<T>(window, bands, size)?;
        Array3::from_shape_vec((bands.len(), size.1, size.0), data)
            .map_err(|e| GdalError::BadArgument(e.to_string()))
    }
}

impl<S: RasterStore + ?Sized> RasterIo for S {}
