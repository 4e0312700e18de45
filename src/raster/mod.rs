//! Strided multi-band raster I/O
//!
//! A [`RasterStore`] owns pixels; the [`RasterIo`] engine, implemented for every
//! store, validates a window, a band selection and a [`BufferLayout`], resolves
//! the element type and strides, and hands the store one [`StridedRequest`].
//!
//! ```
//! use gdal_rasterio::raster::{GdalDataType, MemDataset, RasterIo, Window};
//!
//! let mut ds = MemDataset::new((10, 10), 3, GdalDataType::Float32);
//! let ones = vec![1f32; 10 * 10 * 3];
//! ds.basic_write(Window::new(0, 0, 10, 10), &[1, 2, 3], bytemuck::cast_slice(&ones))?;
//!
//! let back = ds.read_as::<f32>(Window::new(0, 0, 10, 10), &[1, 2, 3], (10, 10))?;
//! assert_eq!(back, ones);
//! # Ok::<(), gdal_rasterio::errors::GdalError>(())
//! ```

mod buffer;
mod io;
mod mem;
mod store;
mod types;
mod window;

pub use buffer::{Buffer, BufferMut, BufferRef, ByteBuffer};
pub use io::{IoDirection, RasterIo, Transfer};
pub use mem::MemDataset;
pub use store::RasterStore;
pub use types::{GdalDataType, GdalType};
pub use window::{BufferLayout, StridedRequest, Strides, Window};
