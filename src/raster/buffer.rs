use crate::raster::{GdalDataType, GdalType};

#[cfg(feature = "array")]
use ndarray::Array2;

/// Caller memory a read transfer fills.
///
/// A closed union over the supported element types. `Raw` is an untyped byte
/// buffer: unless the [`BufferLayout`](crate::raster::BufferLayout) names a
/// type, the element type is taken from the first selected band.
#[derive(Debug)]
pub enum BufferMut<'a> {
    Raw(&'a mut [u8]),
    UInt8(&'a mut [u8]),
    Int8(&'a mut [i8]),
    UInt16(&'a mut [u16]),
    Int16(&'a mut [i16]),
    UInt32(&'a mut [u32]),
    Int32(&'a mut [i32]),
    Float32(&'a mut [f32]),
    Float64(&'a mut [f64]),
}

/// Caller memory a write transfer reads from. Mirrors [`BufferMut`].
#[derive(Debug, Clone, Copy)]
pub enum BufferRef<'a> {
    Raw(&'a [u8]),
    UInt8(&'a [u8]),
    Int8(&'a [i8]),
    UInt16(&'a [u16]),
    Int16(&'a [i16]),
    UInt32(&'a [u32]),
    Int32(&'a [i32]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
}

macro_rules! dispatch {
    ($buf:expr, $ty:ident, $s:ident => $body:expr, raw $r:ident => $raw:expr) => {
        match $buf {
            $ty::Raw($r) => $raw,
            $ty::UInt8($s) => $body,
            $ty::Int8($s) => $body,
            $ty::UInt16($s) => $body,
            $ty::Int16($s) => $body,
            $ty::UInt32($s) => $body,
            $ty::Int32($s) => $body,
            $ty::Float32($s) => $body,
            $ty::Float64($s) => $body,
        }
    };
}

fn typed<T: GdalType>(_: &[T]) -> Option<GdalDataType> {
    Some(T::datatype())
}

impl<'a> BufferMut<'a> {
    /// The element type carried by the buffer, `None` for raw bytes.
    pub fn data_type(&self) -> Option<GdalDataType> {
        dispatch!(self, BufferMut, s => typed(&**s), raw _r => None)
    }

    /// Length of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        dispatch!(self, BufferMut, s => std::mem::size_of_val(&**s), raw r => r.len())
    }

    /// The buffer viewed as bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        dispatch!(self, BufferMut, s => bytemuck::cast_slice_mut(&mut **s), raw r => &mut **r)
    }
}

impl<'a> BufferRef<'a> {
    /// The element type carried by the buffer, `None` for raw bytes.
    pub fn data_type(&self) -> Option<GdalDataType> {
        dispatch!(self, BufferRef, s => typed(&**s), raw _r => None)
    }

    /// Length of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }

    /// The buffer viewed as bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        dispatch!(*self, BufferRef, s => bytemuck::cast_slice(s), raw r => r)
    }
}

macro_rules! impl_from_slice {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl<'a> From<&'a mut [$t]> for BufferMut<'a> {
                fn from(value: &'a mut [$t]) -> Self {
                    BufferMut::$variant(value)
                }
            }

            impl<'a> From<&'a [$t]> for BufferRef<'a> {
                fn from(value: &'a [$t]) -> Self {
                    BufferRef::$variant(value)
                }
            }
        )+
    };
}

impl_from_slice!(
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
);

/// A 2-D array backed by it's `size` (cols, rows) and a row-major `Vec<T>` and it's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
    pub size: (usize, usize),
    pub data: Vec<T>,
}

impl<T: GdalType> Buffer<T> {
    /// Construct a new buffer from `size` (`(cols, rows)`) and `Vec<T>`.
    ///
    /// # Panic
    /// Will panic if `size.0 * size.1 != data.len()`.
    pub fn new(size: (usize, usize), data: Vec<T>) -> Self {
        assert_eq!(
            size.0 * size.1,
            data.len(),
            "size {:?} does not match length {}",
            size,
            data.len()
        );
        Buffer { size, data }
    }

    #[cfg(feature = "array")]
    /// Convert `self` into an [`ndarray::Array2`].
    pub fn to_array(self) -> crate::errors::Result<Array2<T>> {
        // Array2 shape is (rows, cols) and Buffer shape is (cols in x-axis, rows in y-axis)
        Array2::from_shape_vec((self.size.1, self.size.0), self.data)
            .map_err(|e| crate::errors::GdalError::BadArgument(e.to_string()))
    }
}

pub type ByteBuffer = Buffer<u8>;
