use crate::cpl::CslStringList;
use crate::raster::{GdalDataType, MemDataset, RasterIo, Window};

#[cfg(feature = "gdal")]
use std::ffi::c_void;
#[cfg(feature = "gdal")]
use std::marker::PhantomData;
#[cfg(feature = "gdal")]
use std::path::{Path, PathBuf};

/// Routes `tracing` output to the test harness once per process.
///
/// Set `RUST_LOG=gdal_rasterio=debug` to see the engine's transfer logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sample value of `band` at (`col`, `row`) in [`patterned_dataset`]. Fits every supported type.
pub fn pattern_value(band: usize, col: usize, row: usize) -> f64 {
    ((band * 31 + row * 7 + col) % 100) as f64
}

/// An in-memory raster whose bands are filled with [`pattern_value`].
pub fn patterned_dataset(size: (usize, usize), band_types: &[GdalDataType]) -> MemDataset {
    let mut ds = MemDataset::with_band_types(size, band_types);
    for band in 1..=band_types.len() {
        let values: Vec<f64> = (0..size.1)
            .flat_map(|row| (0..size.0).map(move |col| pattern_value(band, col, row)))
            .collect();
        ds.write_band(band, Window::full(size), &crate::raster::Buffer::new(size, values))
            .expect("fill patterned band");
    }
    ds
}

/// RPC metadata for an affine model around (lon 10, lat 45).
///
/// `pixel = 500 * (lon - 10) / 0.1 + 500 + 0.5` and
/// `line = -500 * (lat - 45) / 0.1 + 500 + 0.5`, so lon 10.05 maps to pixel
/// 750.5 and lat 45.05 to line 250.5.
pub fn linear_rpc_metadata() -> CslStringList {
    let mut samp_num = vec!["0"; 20];
    samp_num[1] = "1";
    let mut line_num = vec!["0"; 20];
    line_num[2] = "-1";
    let mut den = vec!["0"; 20];
    den[0] = "1";

    let mut md = CslStringList::new();
    for (key, value) in [
        ("LINE_OFF", "500"),
        ("SAMP_OFF", "500"),
        ("LAT_OFF", "45"),
        ("LONG_OFF", "10"),
        ("HEIGHT_OFF", "0"),
        ("LINE_SCALE", "500"),
        ("SAMP_SCALE", "500"),
        ("LAT_SCALE", "0.1"),
        ("LONG_SCALE", "0.1"),
        ("HEIGHT_SCALE", "1000"),
    ] {
        md.set_name_value(key, value).expect("valid RPC key");
    }
    md.set_name_value("LINE_NUM_COEFF", &line_num.join(" "))
        .expect("valid RPC key");
    md.set_name_value("LINE_DEN_COEFF", &den.join(" "))
        .expect("valid RPC key");
    md.set_name_value("SAMP_NUM_COEFF", &samp_num.join(" "))
        .expect("valid RPC key");
    md.set_name_value("SAMP_DEN_COEFF", &den.join(" "))
        .expect("valid RPC key");
    md
}

/// A struct that contains a temporary directory and a path to a file in that directory.
#[cfg(feature = "gdal")]
pub struct TempFixture {
    _temp_dir: tempfile::TempDir,
    temp_path: PathBuf,
}

#[cfg(feature = "gdal")]
impl TempFixture {
    /// Creates a temporary directory and path to a non-existent file with given `name`.
    /// Useful for writing results to during testing
    ///
    /// Returns the struct `TempFixture` that contains the temp dir (for clean-up on `drop`)
    /// as well as the empty file path.
    pub fn empty(name: &str) -> Self {
        let _temp_dir = tempfile::tempdir().unwrap();
        let temp_path = _temp_dir.path().join(name);
        Self {
            _temp_dir,
            temp_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }
}

#[cfg(feature = "gdal")]
impl AsRef<Path> for TempFixture {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Scoped value for temporarily suppressing thread-local GDAL log messages.
///
/// Useful for tests that expect GDAL errors and want to keep the output log clean
/// of distracting yet expected error messages.
#[cfg(feature = "gdal")]
pub(crate) struct SuppressGDALErrorLog {
    // Make !Sync and !Send, and force use of `new`.
    _private: PhantomData<*mut c_void>,
}

#[cfg(feature = "gdal")]
impl SuppressGDALErrorLog {
    pub(crate) fn new() -> Self {
        unsafe { gdal_sys::CPLPushErrorHandler(Some(gdal_sys::CPLQuietErrorHandler)) };
        SuppressGDALErrorLog {
            _private: PhantomData,
        }
    }
}

#[cfg(feature = "gdal")]
impl Drop for SuppressGDALErrorLog {
    fn drop(&mut self) {
        unsafe { gdal_sys::CPLPopErrorHandler() };
    }
}

/// Assert numerical difference between two expressions is less than
/// 64-bit machine epsilon or a specified epsilon.
///
/// # Examples:
/// ```rust, ignore
/// use gdal_rasterio::assert_near;
/// use std::f64::consts::{PI, E};
/// assert_near!(PI / E, 1.1557273497909217);
/// // with specified epsilon
/// assert_near!(PI / E, 1.15572734, epsilon = 1e-8);
/// ```
#[macro_export]
macro_rules! assert_near {
    ($left:expr, $right:expr) => {
        $crate::assert_near!($left, $right, epsilon = f64::EPSILON)
    };
    ($left:expr, $right:expr, epsilon = $ep:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "|{} - {}| = {} is greater than epsilon {:.4e}",
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    ($left:expr, $right:expr, epsilon = $ep:expr, field = $field:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "field {}: |{} - {}| = {} is greater than epsilon {:.4e}",
            $field,
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    // Pseudo-specialization
    (Point, $left:expr, $right:expr, epsilon = $ep:expr) => {
        $crate::assert_near!($left.0, $right.0, epsilon = $ep, field = "x");
        $crate::assert_near!($left.1, $right.1, epsilon = $ep, field = "y");
        $crate::assert_near!($left.2, $right.2, epsilon = $ep, field = "z");
    };
}
