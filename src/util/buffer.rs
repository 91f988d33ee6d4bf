//! Typed mesh buffers and the component-type dispatch table.

use std::borrow::Cow;
use std::fmt;

use super::{Component, ComponentType, Error, Result};

/// A caller-owned buffer of numeric components.
///
/// Orchestrators allocate one of these per section, sized from the probe
/// results, and hand it to the codec to be filled (on read) or encoded (on
/// write). There is one variant per dispatchable [`ComponentType`].
#[derive(Clone, PartialEq)]
pub enum MeshBuffer {
    Uint8(Vec<u8>),
    Int8(Vec<i8>),
    Uint16(Vec<u16>),
    Int16(Vec<i16>),
    Uint32(Vec<u32>),
    Int32(Vec<i32>),
    Uint64(Vec<u64>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Run `$body` with `$data` bound to the typed contents of `$buffer`.
///
/// This is the single tag -> instantiation table: every codec entry point
/// routes through it into one generic function bounded by [`Component`].
macro_rules! with_buffer {
    ($buffer:expr, $data:ident => $body:expr) => {
        match $buffer {
            $crate::util::MeshBuffer::Uint8($data) => $body,
            $crate::util::MeshBuffer::Int8($data) => $body,
            $crate::util::MeshBuffer::Uint16($data) => $body,
            $crate::util::MeshBuffer::Int16($data) => $body,
            $crate::util::MeshBuffer::Uint32($data) => $body,
            $crate::util::MeshBuffer::Int32($data) => $body,
            $crate::util::MeshBuffer::Uint64($data) => $body,
            $crate::util::MeshBuffer::Int64($data) => $body,
            $crate::util::MeshBuffer::Float32($data) => $body,
            $crate::util::MeshBuffer::Float64($data) => $body,
        }
    };
}
pub(crate) use with_buffer;

impl MeshBuffer {
    /// Allocate a zero-filled buffer of `len` components of type `ty`.
    ///
    /// Fails with [`Error::UnsupportedType`] for types that no Rust numeric
    /// type can hold.
    pub fn zeroed(ty: ComponentType, len: usize) -> Result<Self> {
        Ok(match ty {
            ComponentType::Uint8 => Self::Uint8(vec![0; len]),
            ComponentType::Int8 => Self::Int8(vec![0; len]),
            ComponentType::Uint16 => Self::Uint16(vec![0; len]),
            ComponentType::Int16 => Self::Int16(vec![0; len]),
            ComponentType::Uint32 => Self::Uint32(vec![0; len]),
            ComponentType::Int32 => Self::Int32(vec![0; len]),
            ComponentType::Uint64 => Self::Uint64(vec![0; len]),
            ComponentType::Int64 => Self::Int64(vec![0; len]),
            ComponentType::Float32 => Self::Float32(vec![0.0; len]),
            ComponentType::Float64 => Self::Float64(vec![0.0; len]),
            ComponentType::LongDouble | ComponentType::Unknown => {
                return Err(Error::unsupported(format!(
                    "no buffer representation for component type {}",
                    ty
                )));
            }
        })
    }

    /// Returns the component type tag of this buffer.
    pub fn component_type(&self) -> ComponentType {
        fn tag_of<T: Component>(_: &[T]) -> ComponentType {
            T::COMPONENT_TYPE
        }
        with_buffer!(self, data => tag_of(data))
    }

    /// Number of components in the buffer.
    pub fn len(&self) -> usize {
        with_buffer!(self, data => data.len())
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the contents as `&[T]` if the buffer holds `T`.
    pub fn as_slice<T: Component>(&self) -> Option<&[T]> {
        fn cast<S: Component, T: Component>(data: &[S]) -> Option<&[T]> {
            if S::COMPONENT_TYPE == T::COMPONENT_TYPE {
                Some(bytemuck::cast_slice(data))
            } else {
                None
            }
        }
        with_buffer!(self, data => cast(data))
    }

    /// Copy the contents into a `Vec<f64>`.
    ///
    /// 64-bit integers beyond 2^53 lose precision.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        fn widen<T: Component>(data: &[T]) -> Vec<f64> {
            data.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect()
        }
        with_buffer!(self, data => widen(data))
    }

    /// Convert every value into `out`, which must have the same length.
    ///
    /// Fails with a format error on values that do not fit the target type.
    pub fn cast_into<T: Component>(&self, out: &mut [T]) -> Result<()> {
        if out.len() != self.len() {
            return Err(Error::BufferSize { expected: self.len(), actual: out.len() });
        }
        fn convert<S: Component, T: Component>(src: &[S], out: &mut [T]) -> Result<()> {
            for (o, &s) in out.iter_mut().zip(src) {
                *o = <T as num_traits::NumCast>::from(s).ok_or_else(|| {
                    Error::format(format!("value {} does not fit in {}", s, T::COMPONENT_TYPE))
                })?;
            }
            Ok(())
        }
        with_buffer!(self, data => convert(data, out))
    }

    /// Check that this buffer has type `ty` and exactly `len` components.
    pub fn check(&self, ty: ComponentType, len: usize) -> Result<()> {
        if self.component_type() != ty {
            return Err(Error::TypeMismatch {
                expected: ty.to_string(),
                actual: self.component_type().to_string(),
            });
        }
        if self.len() != len {
            return Err(Error::BufferSize { expected: len, actual: self.len() });
        }
        Ok(())
    }
}

/// Widen `components`-tuples to `width`-tuples, filling with zeros.
///
/// Returns `None` when a tuple is wider than `width` or has no components.
pub fn pad_tuples<T: Component>(data: &[T], components: usize, width: usize) -> Option<Cow<'_, [T]>> {
    if components == 0 || components > width {
        return None;
    }
    if components == width {
        return Some(Cow::Borrowed(data));
    }
    let mut padded = Vec::with_capacity(data.len() / components * width);
    for tuple in data.chunks_exact(components) {
        padded.extend_from_slice(tuple);
        padded.resize(padded.len() + width - components, T::default());
    }
    Some(Cow::Owned(padded))
}

macro_rules! impl_from_vec {
    ($ty:ty, $variant:ident) => {
        impl From<Vec<$ty>> for MeshBuffer {
            fn from(v: Vec<$ty>) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_from_vec!(u8, Uint8);
impl_from_vec!(i8, Int8);
impl_from_vec!(u16, Uint16);
impl_from_vec!(i16, Int16);
impl_from_vec!(u32, Uint32);
impl_from_vec!(i32, Int32);
impl_from_vec!(u64, Uint64);
impl_from_vec!(i64, Int64);
impl_from_vec!(f32, Float32);
impl_from_vec!(f64, Float64);

impl fmt::Debug for MeshBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.component_type(), self.len())
    }
}
