use std::ffi::NulError;

use thiserror::Error;

use crate::alg::TransformFailures;
use crate::raster::GdalDataType;

#[cfg(feature = "gdal")]
use gdal_sys::CPLErr;

#[derive(Clone, Debug, Error)]
pub enum GdalError {
    #[error("FfiNulError")]
    FfiNulError(#[from] NulError),
    #[cfg(feature = "gdal")]
    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CplErrType,
        number: i32,
        msg: String,
    },
    #[error("GDAL method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[error("Raster I/O failed in '{method_name}': {msg}")]
    RasterIo {
        method_name: &'static str,
        msg: String,
    },
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),
    #[error("Data type mismatch: buffer holds {buffer}, layout requests {requested}")]
    DataTypeMismatch {
        buffer: GdalDataType,
        requested: GdalDataType,
    },
    #[error("Invalid RPC model: {msg}")]
    InvalidModel {
        key: Option<&'static str>,
        msg: String,
    },
    #[error("Transform context used after release")]
    ContextReleased,
    #[error("{0}")]
    PartialTransform(TransformFailures),
    #[error("Operation canceled by progress callback")]
    Canceled,
}

impl GdalError {
    /// `true` when a progress callback asked to stop the operation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, GdalError::Canceled)
    }

    pub(crate) fn missing_key(key: &'static str) -> Self {
        GdalError::InvalidModel {
            key: Some(key),
            msg: format!("RPC metadata does not contain {key}"),
        }
    }

    pub(crate) fn invalid_model(msg: impl Into<String>) -> Self {
        GdalError::InvalidModel {
            key: None,
            msg: msg.into(),
        }
    }
}

/// A wrapper for [`CPLErr::Type`] that reflects it as an enum
#[cfg(feature = "gdal")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum CplErrType {
    None = 0,
    Debug = 1,
    Warning = 2,
    Failure = 3,
    Fatal = 4,
}

#[cfg(feature = "gdal")]
impl From<CPLErr::Type> for CplErrType {
    fn from(error_type: CPLErr::Type) -> Self {
        match error_type {
            CPLErr::CE_Debug => Self::Debug,
            CPLErr::CE_Warning => Self::Warning,
            CPLErr::CE_Failure => Self::Failure,
            CPLErr::CE_Fatal => Self::Fatal,
            // fallback type, should not happen
            _ => Self::None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GdalError>;
