//! Progress reporting for long-running batched operations.
//!
//! A progress callback receives the fraction complete (`0.0..=1.0`) and a
//! message, runs synchronously on the calling thread, and returns `false` to
//! ask the operation to stop. A stop request surfaces as
//! [`GdalError::Canceled`], never as an I/O failure.

use crate::errors::{GdalError, Result};

/// Progress callback. Return `false` to cancel.
pub type ProgressFn<'a> = dyn FnMut(f64, &str) -> bool + 'a;

/// Invokes `progress`, if any, and converts a stop request into [`GdalError::Canceled`].
pub(crate) fn report(
    progress: &mut Option<&mut ProgressFn<'_>>,
    complete: f64,
    message: &str,
) -> Result<()> {
    if let Some(callback) = progress.as_mut() {
        if !callback(complete, message) {
            return Err(GdalError::Canceled);
        }
    }
    Ok(())
}

/// Bridges a Rust progress callback to GDAL's `GDALProgressFunc`.
#[cfg(feature = "gdal")]
pub(crate) struct GdalProgress<'a, 'b> {
    callback: Option<&'a mut ProgressFn<'b>>,
    canceled: bool,
}

#[cfg(feature = "gdal")]
impl<'a, 'b> GdalProgress<'a, 'b> {
    pub(crate) fn new(callback: Option<&'a mut ProgressFn<'b>>) -> Self {
        GdalProgress {
            callback,
            canceled: false,
        }
    }

    /// Whether the callback asked GDAL to stop.
    pub(crate) fn canceled(&self) -> bool {
        self.canceled
    }

    pub(crate) fn c_function(&self) -> gdal_sys::GDALProgressFunc {
        if self.callback.is_some() {
            Some(Self::trampoline)
        } else {
            None
        }
    }

    pub(crate) fn c_arg(&mut self) -> *mut libc::c_void {
        self as *mut Self as *mut libc::c_void
    }

    unsafe extern "C" fn trampoline(
        complete: f64,
        message: *const libc::c_char,
        arg: *mut libc::c_void,
    ) -> libc::c_int {
        let state = &mut *(arg as *mut Self);
        let message = if message.is_null() {
            String::new()
        } else {
            crate::utils::_string(message)
        };
        let keep_going = match state.callback.as_mut() {
            Some(callback) => callback(complete, &message),
            None => true,
        };
        if !keep_going {
            state.canceled = true;
        }
        keep_going as libc::c_int
    }
}
