//! Numeric component types - the fundamental storage types of mesh buffers.

use bytemuck::Pod;
use num_traits::{NumCast, ToPrimitive};
use std::fmt;
use std::str::FromStr;

/// Component type tag - the runtime type of every value in a point, cell or
/// attribute buffer.
///
/// Each type has a fixed size and a well-defined binary representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ComponentType {
    /// Unsigned 8-bit integer
    Uint8 = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Unsigned 16-bit integer
    Uint16 = 3,
    /// Signed 16-bit integer
    Int16 = 4,
    /// Unsigned 32-bit integer
    Uint32 = 5,
    /// Signed 32-bit integer
    Int32 = 6,
    /// Unsigned 64-bit integer
    Uint64 = 7,
    /// Signed 64-bit integer
    Int64 = 8,
    /// 32-bit floating point (IEEE 754 single precision)
    Float32 = 9,
    /// 64-bit floating point (IEEE 754 double precision)
    Float64 = 10,
    /// 80-bit x87 extended precision. Known to the registry but has no
    /// Rust counterpart, so no buffer can hold it.
    LongDouble = 11,
    /// Unknown/invalid type
    #[default]
    Unknown = 127,
}

impl ComponentType {
    /// All known component types, in tag order.
    pub const ALL: [ComponentType; 11] = [
        Self::Uint8,
        Self::Int8,
        Self::Uint16,
        Self::Int16,
        Self::Uint32,
        Self::Int32,
        Self::Uint64,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::LongDouble,
    ];

    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
            // 80 significant bits, padded to 16 bytes in memory
            Self::LongDouble => 16,
            Self::Unknown => 0,
        }
    }

    /// Returns the name of this type as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::Uint16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::Uint32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::Uint64 => "uint64_t",
            Self::Int64 => "int64_t",
            Self::Float32 => "float32_t",
            Self::Float64 => "float64_t",
            Self::LongDouble => "float80_t",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns the type name used on VTK legacy section lines.
    pub const fn vtk_name(self) -> Option<&'static str> {
        match self {
            Self::Uint8 => Some("unsigned_char"),
            Self::Int8 => Some("char"),
            Self::Uint16 => Some("unsigned_short"),
            Self::Int16 => Some("short"),
            Self::Uint32 => Some("unsigned_int"),
            Self::Int32 => Some("int"),
            Self::Uint64 => Some("vtktypeuint64"),
            Self::Int64 => Some("vtktypeint64"),
            Self::Float32 => Some("float"),
            Self::Float64 => Some("double"),
            Self::LongDouble | Self::Unknown => None,
        }
    }

    /// Parse a VTK legacy type name (case-insensitive).
    pub fn from_vtk_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "unsigned_char" | "bit" => Self::Uint8,
            "char" => Self::Int8,
            "unsigned_short" => Self::Uint16,
            "short" => Self::Int16,
            "unsigned_int" => Self::Uint32,
            "int" => Self::Int32,
            "unsigned_long" | "vtktypeuint64" => Self::Uint64,
            "long" | "vtktypeint64" | "vtkidtype" => Self::Int64,
            "float" => Self::Float32,
            "double" => Self::Float64,
            _ => Self::Unknown,
        }
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Uint8
                | Self::Int8
                | Self::Uint16
                | Self::Int16
                | Self::Uint32
                | Self::Int32
                | Self::Uint64
                | Self::Int64
        )
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64 | Self::LongDouble)
    }

    /// Returns true if values of this type can be held in a [`MeshBuffer`].
    ///
    /// [`MeshBuffer`]: crate::util::MeshBuffer
    #[inline]
    pub const fn is_dispatchable(self) -> bool {
        !matches!(self, Self::LongDouble | Self::Unknown)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// === Component trait for type-safe conversions ===

/// Trait for Rust numeric types that can be stored in mesh buffers.
///
/// This is a closed set: it is implemented for exactly the types that have a
/// [`MeshBuffer`](crate::util::MeshBuffer) variant.
pub trait Component:
    Pod + Default + PartialEq + PartialOrd + fmt::Debug + fmt::Display + FromStr + NumCast + ToPrimitive + 'static
{
    /// The corresponding ComponentType enum value.
    const COMPONENT_TYPE: ComponentType;

    /// Size of this type in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();

    /// Parse a text token, accepting float notation for integer types when
    /// the value is integral.
    fn parse_token(token: &str) -> Option<Self> {
        if let Ok(v) = token.parse::<Self>() {
            return Some(v);
        }
        let v: f64 = token.parse().ok()?;
        if Self::COMPONENT_TYPE.is_integer() && v.fract() != 0.0 {
            return None;
        }
        <Self as NumCast>::from(v)
    }
}

macro_rules! impl_component {
    ($ty:ty, $variant:ident) => {
        impl Component for $ty {
            const COMPONENT_TYPE: ComponentType = ComponentType::$variant;
        }
    };
}

impl_component!(u8, Uint8);
impl_component!(i8, Int8);
impl_component!(u16, Uint16);
impl_component!(i16, Int16);
impl_component!(u32, Uint32);
impl_component!(i32, Int32);
impl_component!(u64, Uint64);
impl_component!(i64, Int64);
impl_component!(f32, Float32);
impl_component!(f64, Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_sizes() {
        assert_eq!(ComponentType::Uint8.num_bytes(), 1);
        assert_eq!(ComponentType::Int16.num_bytes(), 2);
        assert_eq!(ComponentType::Int32.num_bytes(), 4);
        assert_eq!(ComponentType::Float32.num_bytes(), 4);
        assert_eq!(ComponentType::Float64.num_bytes(), 8);
        assert_eq!(ComponentType::Unknown.num_bytes(), 0);
        assert_eq!(<u16 as Component>::SIZE, ComponentType::Uint16.num_bytes());
        assert_eq!(<f64 as Component>::SIZE, ComponentType::Float64.num_bytes());
    }

    #[test]
    fn test_component_names() {
        assert_eq!(ComponentType::Float32.name(), "float32_t");
    }

    #[test]
    fn test_vtk_names() {
        assert_eq!(ComponentType::from_vtk_name("float"), ComponentType::Float32);
        assert_eq!(ComponentType::from_vtk_name("DOUBLE"), ComponentType::Float64);
        assert_eq!(ComponentType::from_vtk_name("long"), ComponentType::Int64);
        assert_eq!(ComponentType::from_vtk_name("vtkIdType"), ComponentType::Int64);
        assert_eq!(ComponentType::from_vtk_name("string"), ComponentType::Unknown);
        assert_eq!(ComponentType::LongDouble.vtk_name(), None);

        for ty in ComponentType::ALL {
            if let Some(name) = ty.vtk_name() {
                assert_eq!(ComponentType::from_vtk_name(name), ty);
            }
        }
    }

    #[test]
    fn test_dispatchable() {
        assert!(!ComponentType::LongDouble.is_dispatchable());
        assert!(ComponentType::Float64.is_dispatchable());
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(u32::parse_token("42"), Some(42));
        assert_eq!(u32::parse_token("42.0"), Some(42));
        assert_eq!(u32::parse_token("42.5"), None);
        assert_eq!(u8::parse_token("300"), None);
        assert_eq!(f32::parse_token("1e-3"), Some(1e-3));
        assert_eq!(i16::parse_token("-7"), Some(-7));
        assert_eq!(f64::parse_token("abc"), None);
    }
}
