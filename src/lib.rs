//! Strided multi-band raster I/O and batched RPC transforms, modelled on
//! [GDAL](http://gdal.org/)'s `RasterIO` and RPC transformer.
//!
//! The raster engine in [`raster`] moves pixels between a dataset and a
//! caller buffer of any layout: band-sequential, pixel-interleaved, padded,
//! resampled or type converted. [`alg`] turns RPC00B camera models into
//! batched ground/image transforms that report failed points instead of
//! failing the batch.
//!
//! With the `gdal` feature the same operations run against real GDAL
//! datasets through `Dataset`.
//!
//! ## Use
//!
//! ```
//! use gdal_rasterio::raster::{GdalDataType, MemDataset, RasterIo, RasterStore, Window};
//!
//! let mut dataset = MemDataset::new((64, 32), 3, GdalDataType::UInt8);
//! let window = Window::full(dataset.raster_size());
//! dataset.basic_write(window, &[1, 2, 3], &vec![7u8; 64 * 32 * 3])?;
//!
//! let rgb = dataset.read_as::<u8>(window, &[1, 2, 3], (16, 8))?;
//! assert_eq!(rgb.len(), 16 * 8 * 3);
//! # Ok::<(), gdal_rasterio::errors::GdalError>(())
//! ```

#![crate_type = "lib"]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod alg;
pub mod cpl;
pub mod errors;
pub mod metadata;
pub mod progress;
pub mod raster;

#[cfg(feature = "gdal")]
#[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
pub mod config;
#[cfg(feature = "gdal")]
mod dataset;
#[cfg(feature = "gdal")]
mod driver;
#[cfg(feature = "gdal")]
mod utils;

#[cfg(feature = "gdal")]
pub use dataset::Dataset;
#[cfg(feature = "gdal")]
pub use driver::Driver;
pub use metadata::{Metadata, MetadataEntry};

#[cfg(test)]
mod test_utils;
