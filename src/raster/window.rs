use crate::errors::{GdalError, Result};
use crate::raster::GdalDataType;

/// A rectangular region of a raster, in pixels from the top left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(x_off: usize, y_off: usize, width: usize, height: usize) -> Self {
        Window {
            x_off,
            y_off,
            width,
            height,
        }
    }

    /// The window covering a whole raster of `size` (cols, rows).
    pub fn full(size: (usize, usize)) -> Self {
        Window::new(0, 0, size.0, size.1)
    }

    /// Extent of the window as (cols, rows).
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the window lies inside a raster of `raster_size` (cols, rows).
    pub fn fits_within(&self, raster_size: (usize, usize)) -> bool {
        let right = self.x_off.checked_add(self.width);
        let bottom = self.y_off.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= raster_size.0 && b <= raster_size.1)
    }
}

/// Byte distances between consecutive pixels, lines and bands of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strides {
    pub pixel_space: usize,
    pub line_space: usize,
    pub band_space: usize,
}

fn overflow(what: &str, buffer_size: (usize, usize)) -> GdalError {
    GdalError::BadArgument(format!(
        "{what} for a {}x{} buffer overflows the address space",
        buffer_size.0, buffer_size.1
    ))
}

impl Strides {
    /// Resolves zero strides to the packed band-sequential default, axis by axis.
    ///
    /// pixel = element size, line = pixel × buffer width, band = line × buffer height,
    /// each computed from the already resolved stride of the axis before it.
    /// Fails with [`GdalError::BadArgument`] when a default does not fit a `usize`.
    pub fn resolve(
        data_type: GdalDataType,
        buffer_size: (usize, usize),
        pixel_space: usize,
        line_space: usize,
        band_space: usize,
    ) -> Result<Self> {
        let pixel_space = if pixel_space == 0 {
            data_type.bytes()
        } else {
            pixel_space
        };
        let line_space = if line_space == 0 {
            pixel_space
                .checked_mul(buffer_size.0)
                .ok_or_else(|| overflow("line stride", buffer_size))?
        } else {
            line_space
        };
        let band_space = if band_space == 0 {
            line_space
                .checked_mul(buffer_size.1)
                .ok_or_else(|| overflow("band stride", buffer_size))?
        } else {
            band_space
        };
        Ok(Strides {
            pixel_space,
            line_space,
            band_space,
        })
    }

    /// Packed band-sequential layout.
    pub fn packed(data_type: GdalDataType, buffer_size: (usize, usize)) -> Result<Self> {
        Strides::resolve(data_type, buffer_size, 0, 0, 0)
    }

    /// Pixel-interleaved layout (`RGBRGB...`) for `band_count` bands.
    pub fn pixel_interleaved(
        data_type: GdalDataType,
        buffer_size: (usize, usize),
        band_count: usize,
    ) -> Result<Self> {
        let pixel_space = data_type
            .bytes()
            .checked_mul(band_count)
            .ok_or_else(|| overflow("pixel stride", buffer_size))?;
        Strides::resolve(data_type, buffer_size, pixel_space, 0, data_type.bytes())
    }

    /// Line-interleaved layout (`RRR GGG BBB` per line) for `band_count` bands.
    pub fn line_interleaved(
        data_type: GdalDataType,
        buffer_size: (usize, usize),
        band_count: usize,
    ) -> Result<Self> {
        let pixel_space = data_type.bytes();
        let band_space = pixel_space
            .checked_mul(buffer_size.0)
            .ok_or_else(|| overflow("band stride", buffer_size))?;
        let line_space = band_space
            .checked_mul(band_count)
            .ok_or_else(|| overflow("line stride", buffer_size))?;
        Ok(Strides {
            pixel_space,
            line_space,
            band_space,
        })
    }
}

/// How the caller's memory is laid out for a transfer.
///
/// Every field has a "let the engine decide" value: no data type means the
/// buffer's own type (or, for raw bytes, the first band's type), no size means
/// the window size, and zero strides mean the packed default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferLayout {
    pub data_type: Option<GdalDataType>,
    pub size: Option<(usize, usize)>,
    pub pixel_space: usize,
    pub line_space: usize,
    pub band_space: usize,
}

impl BufferLayout {
    /// Packed layout at window size.
    pub fn packed() -> Self {
        Self::default()
    }

    pub fn with_data_type(mut self, data_type: GdalDataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Buffer extent (cols, rows); the store resamples when it differs from the window.
    pub fn with_size(mut self, size: (usize, usize)) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_strides(mut self, pixel_space: usize, line_space: usize, band_space: usize) -> Self {
        self.pixel_space = pixel_space;
        self.line_space = line_space;
        self.band_space = band_space;
        self
    }

    pub fn with_resolved(self, strides: Strides) -> Self {
        self.with_strides(strides.pixel_space, strides.line_space, strides.band_space)
    }

    /// Buffer extent for a transfer over `window`.
    pub fn buffer_size(&self, window: &Window) -> (usize, usize) {
        self.size.unwrap_or(window.size())
    }

    /// Strides for elements of `data_type`, zero axes replaced by the packed default.
    pub fn resolve_strides(&self, data_type: GdalDataType, window: &Window) -> Result<Strides> {
        Strides::resolve(
            data_type,
            self.buffer_size(window),
            self.pixel_space,
            self.line_space,
            self.band_space,
        )
    }
}

/// One fully resolved strided copy, as handed to a [`RasterStore`](crate::raster::RasterStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedRequest<'a> {
    pub window: Window,
    pub buffer_size: (usize, usize),
    pub data_type: GdalDataType,
    pub bands: &'a [usize],
    pub strides: Strides,
}

impl<'a> StridedRequest<'a> {
    /// Byte offset in the buffer of the element at (`col`, `row`) of the `band_pos`-th selected band.
    pub fn offset(&self, band_pos: usize, col: usize, row: usize) -> usize {
        band_pos * self.strides.band_space
            + row * self.strides.line_space
            + col * self.strides.pixel_space
    }

    /// Smallest buffer length in bytes that covers every element this request touches.
    ///
    /// `None` when the layout overflows `usize`.
    pub fn required_len(&self) -> Option<usize> {
        let (cols, rows) = self.buffer_size;
        if cols == 0 || rows == 0 || self.bands.is_empty() {
            return Some(0);
        }
        let last_band = (self.bands.len() - 1).checked_mul(self.strides.band_space)?;
        let last_row = (rows - 1).checked_mul(self.strides.line_space)?;
        let last_col = (cols - 1).checked_mul(self.strides.pixel_space)?;
        last_band
            .checked_add(last_row)?
            .checked_add(last_col)?
            .checked_add(self.data_type.bytes())
    }

    /// Fails when `buffer_len` bytes cannot hold this request.
    pub fn check_buffer(&self, buffer_len: usize) -> Result<()> {
        match self.required_len() {
            Some(required) if required <= buffer_len => Ok(()),
            Some(required) => Err(GdalError::BadArgument(format!(
                "buffer of {buffer_len} bytes is too short, layout needs {required}"
            ))),
            None => Err(GdalError::BadArgument(
                "buffer layout overflows the address space".to_string(),
            )),
        }
    }
}
