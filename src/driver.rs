use std::ffi::CString;
use std::path::Path;
use std::sync::Once;

use gdal_sys::GDALDriverH;
use libc::c_int;
use tracing::debug;

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::errors::*;
use crate::raster::{GdalDataType, GdalType};
use crate::utils::{_last_null_pointer_err, _path_to_c_string, _string};

static START: Once = Once::new();

/// Registers every GDAL driver, once per process.
pub fn _register_drivers() {
    START.call_once(|| {
        unsafe { gdal_sys::GDALAllRegister() };
        debug!("gdal drivers registered");
    });
}

/// A GDAL format driver, used to create datasets.
#[allow(missing_copy_implementations)]
pub struct Driver {
    c_driver: GDALDriverH,
}

impl Driver {
    /// Returns the driver with the given short name, e.g. `"MEM"` or `"GTiff"`.
    pub fn get_by_name(name: &str) -> Result<Driver> {
        _register_drivers();
        let c_name = CString::new(name)?;
        let c_driver = unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) };
        if c_driver.is_null() {
            return Err(_last_null_pointer_err("GDALGetDriverByName"));
        };
        Ok(Driver { c_driver })
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_driver(&self) -> GDALDriverH {
        self.c_driver
    }

    pub fn short_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverShortName(self.c_driver) };
        _string(rv)
    }

    /// Creates a dataset of `size` (cols, rows) with `bands` bands of `data_type`.
    pub fn create<P: AsRef<Path>>(
        &self,
        filename: P,
        size: (usize, usize),
        bands: usize,
        data_type: GdalDataType,
    ) -> Result<Dataset> {
        self.create_with_options(filename, size, bands, data_type, &CslStringList::new())
    }

    /// Like [`create`](Driver::create), with the element type taken from `T`.
    pub fn create_with_band_type<T: GdalType, P: AsRef<Path>>(
        &self,
        filename: P,
        size: (usize, usize),
        bands: usize,
    ) -> Result<Dataset> {
        self.create(filename, size, bands, T::datatype())
    }

    /// Creates a dataset, passing driver specific creation `options` (e.g. `TILED=YES`).
    pub fn create_with_options<P: AsRef<Path>>(
        &self,
        filename: P,
        size: (usize, usize),
        bands: usize,
        data_type: GdalDataType,
        options: &CslStringList,
    ) -> Result<Dataset> {
        let to_c_int = |v: usize, what: &str| {
            c_int::try_from(v).map_err(|_| GdalError::BadArgument(format!("{what} {v} exceeds a C int")))
        };
        let c_type = data_type.to_c_type()?;
        let c_filename = _path_to_c_string(filename)?;
        let mut c_options = options.to_c_list()?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreate(
                self.c_driver,
                c_filename.as_ptr(),
                to_c_int(size.0, "width")?,
                to_c_int(size.1, "height")?,
                to_c_int(bands, "band count")?,
                c_type,
                c_options.as_mut_ptr() as _,
            )
        };

        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALCreate"));
        };

        Ok(unsafe { Dataset::from_c_dataset(c_dataset) })
    }
}
