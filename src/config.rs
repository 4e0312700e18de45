//! GDAL configuration options
//!
//! Process-wide and thread-local `KEY=VALUE` settings read by GDAL itself,
//! such as the block cache size behind every raster transfer
//! (`GDAL_CACHEMAX`) or the worker count of whole-raster copies
//! (`GDAL_NUM_THREADS`). Options set here override environment variables.
//!
//! ```no_run
//! use gdal_rasterio::config::*;
//!
//! // Increase GDAL's block cache to 1024Mb
//! set_config_option("GDAL_CACHEMAX", "1024").unwrap();
//! assert_eq!(get_config_option("GDAL_CACHEMAX", "").unwrap(), "1024");
//!
//! clear_config_option("GDAL_CACHEMAX").unwrap();
//! assert_eq!(get_config_option("GDAL_CACHEMAX", "XXX").unwrap(), "XXX");
//! ```
//!
//! Refer to [GDAL `ConfigOptions`](https://gdal.org/user/configoptions.html) for
//! a full list of options.

use std::ffi::CString;
use std::marker::PhantomData;

use tracing::debug;

use crate::errors::Result;
use crate::utils::_string;

#[derive(Clone, Copy)]
enum Scope {
    Global,
    ThreadLocal,
}

fn put(scope: Scope, key: &str, value: Option<&str>) -> Result<()> {
    let c_key = CString::new(key)?;
    let c_val = value.map(CString::new).transpose()?;
    let val_ptr = c_val.as_ref().map_or(std::ptr::null(), |v| v.as_ptr());
    unsafe {
        match scope {
            Scope::Global => gdal_sys::CPLSetConfigOption(c_key.as_ptr(), val_ptr),
            Scope::ThreadLocal => gdal_sys::CPLSetThreadLocalConfigOption(c_key.as_ptr(), val_ptr),
        }
    };
    Ok(())
}

/// The current value, or `None` when unset in `scope`. The global scope sees
/// thread-local values and environment variables too.
fn lookup(scope: Scope, key: &str) -> Result<Option<String>> {
    let c_key = CString::new(key)?;
    let rv = unsafe {
        match scope {
            Scope::Global => gdal_sys::CPLGetConfigOption(c_key.as_ptr(), std::ptr::null()),
            Scope::ThreadLocal => {
                gdal_sys::CPLGetThreadLocalConfigOption(c_key.as_ptr(), std::ptr::null())
            }
        }
    };
    Ok((!rv.is_null()).then(|| _string(rv)))
}

/// Set a GDAL library configuration option
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    put(Scope::Global, key, Some(value))
}

/// Get the value of a GDAL library configuration option
///
/// If the config option specified by `key` is not found, `default` is returned.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    Ok(lookup(Scope::Global, key)?.unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a GDAL library configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    put(Scope::Global, key, None)
}

/// Set a GDAL library configuration option
/// with **thread local** scope
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    put(Scope::ThreadLocal, key, Some(value))
}

/// Get the value of a GDAL library configuration option
/// with **thread local** scope
///
/// If the config option specified by `key` is not found, `default` is returned.
pub fn get_thread_local_config_option(key: &str, default: &str) -> Result<String> {
    Ok(lookup(Scope::ThreadLocal, key)?.unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a GDAL library configuration option
/// with **thread local** scope
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    put(Scope::ThreadLocal, key, None)
}

/// A thread-local option that is put back the way it was when the guard drops.
///
/// ```no_run
/// use gdal_rasterio::config::ThreadLocalConfigOption;
///
/// let _threads = ThreadLocalConfigOption::set("GDAL_NUM_THREADS", "ALL_CPUS").unwrap();
/// // copies started on this thread now use every core
/// ```
pub struct ThreadLocalConfigOption {
    key: String,
    previous: Option<String>,
    // thread-local state must be restored on the thread that set it
    _not_send: PhantomData<*mut ()>,
}

impl ThreadLocalConfigOption {
    pub fn set(key: &str, value: &str) -> Result<Self> {
        let previous = lookup(Scope::ThreadLocal, key)?;
        put(Scope::ThreadLocal, key, Some(value))?;
        debug!(key, value, ?previous, "thread-local config option set");
        Ok(ThreadLocalConfigOption {
            key: key.to_string(),
            previous,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ThreadLocalConfigOption {
    fn drop(&mut self) {
        // key and value were NUL-checked in `set`
        let _ = put(Scope::ThreadLocal, &self.key, self.previous.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_options() {
        // We cannot test different global config scenarios in parallel since we modify a global config state in GDAL.
        // Therefore, we test the config option behavior sequentially to avoid data races.

        test_set_get_option();

        test_set_option_with_embedded_nul();

        test_clear_option();

        test_scoped_thread_local_option();
    }

    fn test_set_get_option() {
        assert!(set_config_option("GDAL_CACHEMAX", "128").is_ok());
        assert_eq!(get_config_option("GDAL_CACHEMAX", "").unwrap(), "128");
        assert_eq!(
            get_config_option("NON_EXISTANT_OPTION", "DEFAULT_VALUE").unwrap(),
            "DEFAULT_VALUE"
        );
    }

    fn test_set_option_with_embedded_nul() {
        assert!(set_config_option("f\0oo", "valid").is_err());
        assert!(set_config_option("foo", "in\0valid").is_err());
        assert!(set_thread_local_config_option("f\0oo", "valid").is_err());
        assert!(ThreadLocalConfigOption::set("f\0oo", "valid").is_err());
    }

    fn test_clear_option() {
        assert!(set_config_option("TEST_OPTION", "256").is_ok());
        assert_eq!(get_config_option("TEST_OPTION", "DEFAULT").unwrap(), "256");
        assert!(clear_config_option("TEST_OPTION").is_ok());
        assert_eq!(get_config_option("TEST_OPTION", "DEFAULT").unwrap(), "DEFAULT");
    }

    fn test_scoped_thread_local_option() {
        set_thread_local_config_option("GDAL_NUM_THREADS", "2").unwrap();
        {
            let _guard = ThreadLocalConfigOption::set("GDAL_NUM_THREADS", "ALL_CPUS").unwrap();
            assert_eq!(
                get_thread_local_config_option("GDAL_NUM_THREADS", "").unwrap(),
                "ALL_CPUS"
            );
            // thread-local values override the global getter
            assert_eq!(get_config_option("GDAL_NUM_THREADS", "").unwrap(), "ALL_CPUS");
        }
        assert_eq!(
            get_thread_local_config_option("GDAL_NUM_THREADS", "").unwrap(),
            "2"
        );

        clear_thread_local_config_option("GDAL_NUM_THREADS").unwrap();
        {
            let _guard = ThreadLocalConfigOption::set("GDAL_NUM_THREADS", "4").unwrap();
        }
        assert_eq!(
            get_thread_local_config_option("GDAL_NUM_THREADS", "DEFAULT").unwrap(),
            "DEFAULT"
        );
    }
}
