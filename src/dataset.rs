use std::ffi::CString;
use std::path::Path;
use std::ptr::null_mut;

use gdal_sys::{self, CPLErr, GDALAccess, GDALDatasetH, GDALRWFlag, GSpacing};
use libc::{c_int, c_void};
use tracing::debug;

use crate::config::ThreadLocalConfigOption;
use crate::cpl::CslStringList;
use crate::driver::_register_drivers;
use crate::errors::*;
use crate::metadata::Metadata;
use crate::progress::{GdalProgress, ProgressFn};
use crate::raster::{GdalDataType, RasterStore, StridedRequest, Window};
use crate::utils::{_last_cpl_err, _last_null_pointer_err, _path_to_c_string, _string, _string_array};

/// A raster dataset opened or created through GDAL.
#[derive(Debug)]
pub struct Dataset {
    c_dataset: GDALDatasetH,
}

// GDAL Docs state: The returned dataset should only be accessed by one thread at a time.
// See: https://gdal.org/api/raster_c_api.html#_CPPv48GDALOpenPKc10GDALAccess
unsafe impl Send for Dataset {}

fn c_int_of(value: usize, what: &str) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| GdalError::BadArgument(format!("{what} {value} exceeds a C int")))
}

fn c_band_map(bands: &[usize]) -> Result<Vec<c_int>> {
    bands.iter().map(|&b| c_int_of(b, "band index")).collect()
}

fn spacing(value: usize) -> Result<GSpacing> {
    GSpacing::try_from(value).map_err(|_| GdalError::BadArgument(format!("stride {value} too large")))
}

impl Dataset {
    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_dataset(&self) -> GDALDatasetH {
        self.c_dataset
    }

    /// Creates a new Dataset by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_dataset(c_dataset: GDALDatasetH) -> Dataset {
        Dataset { c_dataset }
    }

    /// Opens a raster read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        Self::open_with_access(path, GDALAccess::GA_ReadOnly)
    }

    /// Opens a raster for reading and writing.
    pub fn open_for_update<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        Self::open_with_access(path, GDALAccess::GA_Update)
    }

    fn open_with_access<P: AsRef<Path>>(path: P, access: GDALAccess::Type) -> Result<Dataset> {
        _register_drivers();
        let c_filename = _path_to_c_string(path.as_ref())?;
        let c_dataset = unsafe { gdal_sys::GDALOpen(c_filename.as_ptr(), access) };
        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALOpen"));
        }
        debug!(path = %path.as_ref().display(), "dataset opened");
        Ok(Dataset { c_dataset })
    }

    /// Appends a band of `data_type`. Only some drivers (e.g. `MEM`) support this.
    pub fn add_band(&mut self, data_type: GdalDataType, options: &CslStringList) -> Result<usize> {
        let c_type = data_type.to_c_type()?;
        let mut c_options = options.to_c_list()?;
        let rv = unsafe {
            gdal_sys::GDALAddBand(self.c_dataset, c_type, c_options.as_mut_ptr() as _)
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(self.raster_count())
    }

    /// Flushes pending writes to disk.
    pub fn flush_cache(&mut self) {
        unsafe { gdal_sys::GDALFlushCache(self.c_dataset) };
    }

    fn c_band(&self, band_index: usize) -> Result<gdal_sys::GDALRasterBandH> {
        let c_band = unsafe {
            gdal_sys::GDALGetRasterBand(self.c_dataset, c_int_of(band_index, "band index")?)
        };
        if c_band.is_null() {
            return Err(_last_null_pointer_err("GDALGetRasterBand"));
        }
        Ok(c_band)
    }

    fn raster_io(
        &self,
        flag: GDALRWFlag::Type,
        request: &StridedRequest<'_>,
        data: *mut c_void,
        data_len: usize,
    ) -> Result<()> {
        // GDAL trusts the strides blindly, so the bounds check happens here
        request.check_buffer(data_len)?;
        let window = request.window;
        let c_type = request.data_type.to_c_type()?;
        let mut band_map = c_band_map(request.bands)?;
        let rv = unsafe {
            gdal_sys::GDALDatasetRasterIOEx(
                self.c_dataset,
                flag,
                c_int_of(window.x_off, "x offset")?,
                c_int_of(window.y_off, "y offset")?,
                c_int_of(window.width, "window width")?,
                c_int_of(window.height, "window height")?,
                data,
                c_int_of(request.buffer_size.0, "buffer width")?,
                c_int_of(request.buffer_size.1, "buffer height")?,
                c_type,
                c_int_of(band_map.len(), "band count")?,
                band_map.as_mut_ptr(),
                spacing(request.strides.pixel_space)?,
                spacing(request.strides.line_space)?,
                spacing(request.strides.band_space)?,
                null_mut(),
            )
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    /// Copies every band into `dst` with `GDALDatasetCopyWholeRaster`.
    ///
    /// `NUM_THREADS` sets `GDAL_NUM_THREADS` on this thread for the duration
    /// of the copy, so drivers that compress or decompress in worker threads
    /// pick it up. Every other option goes to GDAL untouched (`INTERLEAVE`,
    /// `COMPRESSED`, `SKIP_HOLES`). A progress callback returning `false` stops
    /// the copy with [`GdalError::Canceled`].
    pub fn copy_whole_raster_native(
        &self,
        dst: &mut Dataset,
        options: &CslStringList,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        let mut options = options.clone();
        let _threads = options
            .remove("NUM_THREADS")
            .map(|threads| ThreadLocalConfigOption::set("GDAL_NUM_THREADS", &threads))
            .transpose()?;
        let mut c_options = options.to_c_list()?;
        let mut progress = GdalProgress::new(progress);
        let rv = unsafe {
            gdal_sys::GDALDatasetCopyWholeRaster(
                self.c_dataset,
                dst.c_dataset,
                c_options.as_mut_ptr() as _,
                progress.c_function(),
                progress.c_arg(),
            )
        };
        if progress.canceled() {
            unsafe { gdal_sys::CPLErrorReset() };
            return Err(GdalError::Canceled);
        }
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }
}

impl RasterStore for Dataset {
    fn raster_size(&self) -> (usize, usize) {
        let size_x = unsafe { gdal_sys::GDALGetRasterXSize(self.c_dataset) } as usize;
        let size_y = unsafe { gdal_sys::GDALGetRasterYSize(self.c_dataset) } as usize;
        (size_x, size_y)
    }

    fn raster_count(&self) -> usize {
        (unsafe { gdal_sys::GDALGetRasterCount(self.c_dataset) }) as usize
    }

    fn band_type(&self, band_index: usize) -> Result<GdalDataType> {
        let c_band = self.c_band(band_index)?;
        GdalDataType::try_from(unsafe { gdal_sys::GDALGetRasterDataType(c_band) })
    }

    fn block_size(&self) -> (usize, usize) {
        if self.raster_count() == 0 {
            return (self.raster_size().0, 1);
        }
        let Ok(c_band) = self.c_band(1) else {
            return (self.raster_size().0, 1);
        };
        let (mut size_x, mut size_y) = (0, 0);
        unsafe { gdal_sys::GDALGetBlockSize(c_band, &mut size_x, &mut size_y) };
        (size_x.max(1) as usize, size_y.max(1) as usize)
    }

    fn file_list(&self) -> Vec<String> {
        let files = unsafe { gdal_sys::GDALGetFileList(self.c_dataset) };
        let result = _string_array(files);
        unsafe { gdal_sys::CSLDestroy(files) };
        result
    }

    fn read_strided(&self, request: &StridedRequest<'_>, buffer: &mut [u8]) -> Result<()> {
        self.raster_io(
            GDALRWFlag::GF_Read,
            request,
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len(),
        )
    }

    fn write_strided(&mut self, request: &StridedRequest<'_>, buffer: &[u8]) -> Result<()> {
        // GF_Write only reads from the buffer
        self.raster_io(
            GDALRWFlag::GF_Write,
            request,
            buffer.as_ptr() as *mut c_void,
            buffer.len(),
        )
    }

    fn advise_read(
        &self,
        window: Window,
        buffer_size: (usize, usize),
        data_type: GdalDataType,
        bands: &[usize],
        options: &CslStringList,
    ) -> Result<()> {
        let mut band_map = c_band_map(bands)?;
        let mut c_options = options.to_c_list()?;
        let rv = unsafe {
            gdal_sys::GDALDatasetAdviseRead(
                self.c_dataset,
                c_int_of(window.x_off, "x offset")?,
                c_int_of(window.y_off, "y offset")?,
                c_int_of(window.width, "window width")?,
                c_int_of(window.height, "window height")?,
                c_int_of(buffer_size.0, "buffer width")?,
                c_int_of(buffer_size.1, "buffer height")?,
                data_type.to_c_type()?,
                c_int_of(band_map.len(), "band count")?,
                band_map.as_mut_ptr(),
                c_options.as_mut_ptr() as _,
            )
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }
}

impl Metadata for Dataset {
    fn description(&self) -> Result<String> {
        let description = unsafe { gdal_sys::GDALGetDescription(self.c_dataset) };
        if description.is_null() {
            return Err(_last_null_pointer_err("GDALGetDescription"));
        }
        Ok(_string(description))
    }

    fn metadata_domains(&self) -> Vec<String> {
        let domains = unsafe { gdal_sys::GDALGetMetadataDomainList(self.c_dataset) };
        let result = _string_array(domains);
        unsafe { gdal_sys::CSLDestroy(domains) };
        result
    }

    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>> {
        let c_domain = CString::new(domain).ok()?;
        // owned by the dataset, not to be freed
        let items = unsafe { gdal_sys::GDALGetMetadata(self.c_dataset, c_domain.as_ptr()) };
        if items.is_null() {
            return None;
        }
        Some(_string_array(items))
    }

    fn set_metadata_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()> {
        let c_key = CString::new(key)?;
        let c_value = CString::new(value)?;
        let c_domain = CString::new(domain)?;
        let rv = unsafe {
            gdal_sys::GDALSetMetadataItem(
                self.c_dataset,
                c_key.as_ptr(),
                c_value.as_ptr(),
                c_domain.as_ptr(),
            )
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    fn metadata_item(&self, key: &str, domain: &str) -> Option<String> {
        let c_key = CString::new(key).ok()?;
        let c_domain = CString::new(domain).ok()?;
        let rv = unsafe {
            gdal_sys::GDALGetMetadataItem(self.c_dataset, c_key.as_ptr(), c_domain.as_ptr())
        };
        if rv.is_null() {
            return None;
        }
        Some(_string(rv))
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALClose(self.c_dataset);
        }
    }
}
