use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{GdalError, Result};

/// Element types a raster transfer can move.
///
/// This is the closed set the engine accepts at its boundary; band types a
/// store reports outside of it (complex, 64-bit integers, ...) are rejected
/// with [`GdalError::UnsupportedDataType`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum GdalDataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl GdalDataType {
    /// All supported types, smallest first.
    pub fn available_types() -> &'static [GdalDataType] {
        use GdalDataType::*;
        &[UInt8, Int8, UInt16, Int16, UInt32, Int32, Float32, Float64]
    }

    /// Get the type name, as GDAL spells it.
    pub fn name(&self) -> &'static str {
        match self {
            GdalDataType::UInt8 => "Byte",
            GdalDataType::Int8 => "Int8",
            GdalDataType::UInt16 => "UInt16",
            GdalDataType::Int16 => "Int16",
            GdalDataType::UInt32 => "UInt32",
            GdalDataType::Int32 => "Int32",
            GdalDataType::Float32 => "Float32",
            GdalDataType::Float64 => "Float64",
        }
    }

    /// Get the type size in **bytes**.
    pub fn bytes(&self) -> usize {
        match self {
            GdalDataType::UInt8 | GdalDataType::Int8 => 1,
            GdalDataType::UInt16 | GdalDataType::Int16 => 2,
            GdalDataType::UInt32 | GdalDataType::Int32 | GdalDataType::Float32 => 4,
            GdalDataType::Float64 => 8,
        }
    }

    /// Get the type size in **bits**.
    pub fn bits(&self) -> usize {
        self.bytes() * 8
    }

    /// Returns `true` if data type is integral (non-floating point)
    pub fn is_integer(&self) -> bool {
        !self.is_floating()
    }

    /// Returns `true` if data type is floating point (non-integral)
    pub fn is_floating(&self) -> bool {
        matches!(self, GdalDataType::Float32 | GdalDataType::Float64)
    }

    /// Returns `true` if data type supports negative values.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            GdalDataType::UInt8 | GdalDataType::UInt16 | GdalDataType::UInt32
        )
    }

    /// Decodes one native-endian element from the front of `bytes`.
    pub(crate) fn read_f64(&self, bytes: &[u8]) -> f64 {
        fn arr<const N: usize>(b: &[u8]) -> [u8; N] {
            let mut out = [0u8; N];
            out.copy_from_slice(&b[..N]);
            out
        }
        match self {
            GdalDataType::UInt8 => bytes[0] as f64,
            GdalDataType::Int8 => bytes[0] as i8 as f64,
            GdalDataType::UInt16 => u16::from_ne_bytes(arr(bytes)) as f64,
            GdalDataType::Int16 => i16::from_ne_bytes(arr(bytes)) as f64,
            GdalDataType::UInt32 => u32::from_ne_bytes(arr(bytes)) as f64,
            GdalDataType::Int32 => i32::from_ne_bytes(arr(bytes)) as f64,
            GdalDataType::Float32 => f32::from_ne_bytes(arr(bytes)) as f64,
            GdalDataType::Float64 => f64::from_ne_bytes(arr(bytes)),
        }
    }

    /// Encodes `value` into the front of `bytes`.
    ///
    /// Integer targets round to nearest and saturate at the type bounds; NaN becomes 0.
    pub(crate) fn write_f64(&self, value: f64, bytes: &mut [u8]) {
        let n = self.bytes();
        let rounded = value.round();
        // `as` from float to int saturates and maps NaN to 0
        match self {
            GdalDataType::UInt8 => bytes[0] = rounded as u8,
            GdalDataType::Int8 => bytes[0] = (rounded as i8) as u8,
            GdalDataType::UInt16 => bytes[..n].copy_from_slice(&(rounded as u16).to_ne_bytes()),
            GdalDataType::Int16 => bytes[..n].copy_from_slice(&(rounded as i16).to_ne_bytes()),
            GdalDataType::UInt32 => bytes[..n].copy_from_slice(&(rounded as u32).to_ne_bytes()),
            GdalDataType::Int32 => bytes[..n].copy_from_slice(&(rounded as i32).to_ne_bytes()),
            GdalDataType::Float32 => bytes[..n].copy_from_slice(&(value as f32).to_ne_bytes()),
            GdalDataType::Float64 => bytes[..n].copy_from_slice(&value.to_ne_bytes()),
        }
    }

    /// Copies one element from `src` (of type `self`) into `dst` (of type `dst_type`),
    /// converting when the types differ.
    pub(crate) fn convert_into(&self, src: &[u8], dst_type: GdalDataType, dst: &mut [u8]) {
        if *self == dst_type {
            let n = self.bytes();
            dst[..n].copy_from_slice(&src[..n]);
        } else {
            dst_type.write_f64(self.read_f64(src), dst);
        }
    }
}

impl Display for GdalDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GdalDataType {
    type Err = GdalError;

    fn from_str(s: &str) -> Result<Self> {
        GdalDataType::available_types()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .or(match s.to_ascii_lowercase().as_str() {
                "uint8" => Some(GdalDataType::UInt8),
                _ => None,
            })
            .ok_or_else(|| GdalError::UnsupportedDataType(s.to_string()))
    }
}

#[cfg(feature = "gdal")]
impl TryFrom<gdal_sys::GDALDataType::Type> for GdalDataType {
    type Error = GdalError;

    fn try_from(value: gdal_sys::GDALDataType::Type) -> Result<Self> {
        use gdal_sys::GDALDataType::*;
        match value {
            GDT_Byte => Ok(GdalDataType::UInt8),
            GDT_UInt16 => Ok(GdalDataType::UInt16),
            GDT_Int16 => Ok(GdalDataType::Int16),
            GDT_UInt32 => Ok(GdalDataType::UInt32),
            GDT_Int32 => Ok(GdalDataType::Int32),
            GDT_Float32 => Ok(GdalDataType::Float32),
            GDT_Float64 => Ok(GdalDataType::Float64),
            other => {
                let c_name = unsafe { gdal_sys::GDALGetDataTypeName(other) };
                if c_name.is_null() {
                    return Err(GdalError::UnsupportedDataType(format!(
                        "GDALDataType {other}"
                    )));
                }
                // GDT_Int8 only exists from GDAL 3.7 on, so it is matched by name
                match crate::utils::_string(c_name).as_str() {
                    "Int8" => Ok(GdalDataType::Int8),
                    name => Err(GdalError::UnsupportedDataType(name.to_string())),
                }
            }
        }
    }
}

#[cfg(feature = "gdal")]
impl GdalDataType {
    /// The GDAL type tag of this type.
    ///
    /// `Int8` maps to `GDT_Int8`, looked up at runtime; GDAL builds older than
    /// 3.7 have no signed 8-bit type and fail with [`GdalError::UnsupportedDataType`].
    pub(crate) fn to_c_type(self) -> Result<gdal_sys::GDALDataType::Type> {
        use gdal_sys::GDALDataType::*;
        Ok(match self {
            GdalDataType::UInt8 => GDT_Byte,
            GdalDataType::UInt16 => GDT_UInt16,
            GdalDataType::Int16 => GDT_Int16,
            GdalDataType::UInt32 => GDT_UInt32,
            GdalDataType::Int32 => GDT_Int32,
            GdalDataType::Float32 => GDT_Float32,
            GdalDataType::Float64 => GDT_Float64,
            GdalDataType::Int8 => {
                let c_name = std::ffi::CString::new(self.name())?;
                let c_type = unsafe { gdal_sys::GDALGetDataTypeByName(c_name.as_ptr()) };
                if c_type == GDT_Unknown {
                    return Err(GdalError::UnsupportedDataType(
                        "Int8 needs GDAL 3.7 or later".to_string(),
                    ));
                }
                c_type
            }
        })
    }
}

/// Type-level constraint for limiting which primitive numeric values can be passed
/// to functions needing target data type.
pub trait GdalType: bytemuck::Pod {
    fn datatype() -> GdalDataType;
}

impl GdalType for u8 {
    fn datatype() -> GdalDataType {
        GdalDataType::UInt8
    }
}

impl GdalType for i8 {
    fn datatype() -> GdalDataType {
        GdalDataType::Int8
    }
}

impl GdalType for u16 {
    fn datatype() -> GdalDataType {
        GdalDataType::UInt16
    }
}

impl GdalType for i16 {
    fn datatype() -> GdalDataType {
        GdalDataType::Int16
    }
}

impl GdalType for u32 {
    fn datatype() -> GdalDataType {
        GdalDataType::UInt32
    }
}

impl GdalType for i32 {
    fn datatype() -> GdalDataType {
        GdalDataType::Int32
    }
}

impl GdalType for f32 {
    fn datatype() -> GdalDataType {
        GdalDataType::Float32
    }
}

impl GdalType for f64 {
    fn datatype() -> GdalDataType {
        GdalDataType::Float64
    }
}
