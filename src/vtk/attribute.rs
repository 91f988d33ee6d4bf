//! Attribute blocks of VTK legacy files.
//!
//! Inside a `POINT_DATA n` or `CELL_DATA n` block each attribute starts with
//! a header line naming its kind:
//!
//! ```text
//! SCALARS name type [components]
//! LOOKUP_TABLE default
//! VECTORS name type
//! NORMALS name type
//! TENSORS name type
//! COLOR_SCALARS name components
//! ```
//!
//! Tensors are always stored as full 3x3 matrices; in memory a symmetric
//! tensor keeps only its independent components, either `(xx, xy, yy)` for
//! an in-plane tensor or `(xx, xy, xz, yy, yz, zz)`.

use crate::core::FileType;
use crate::util::{ComponentType, Error, PixelType, Result};

/// Kind of an attribute block, as named by its header keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Scalars,
    Vectors,
    Normals,
    Tensors,
    ColorScalars,
}

impl AttributeKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Scalars => "SCALARS",
            Self::Vectors => "VECTORS",
            Self::Normals => "NORMALS",
            Self::Tensors => "TENSORS",
            Self::ColorScalars => "COLOR_SCALARS",
        }
    }

    /// Name used in metadata keys.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scalars => "scalars",
            Self::Vectors => "vectors",
            Self::Normals => "normals",
            Self::Tensors => "tensors",
            Self::ColorScalars => "color_scalars",
        }
    }

    /// Kind named by a header keyword, ignoring ASCII case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        [
            Self::Scalars,
            Self::Vectors,
            Self::Normals,
            Self::Tensors,
            Self::ColorScalars,
        ]
        .into_iter()
        .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
    }

    /// Pixel type reported for blocks of this kind.
    pub const fn pixel_type(self) -> PixelType {
        match self {
            Self::Scalars => PixelType::Scalar,
            Self::Vectors => PixelType::Vector,
            Self::Normals => PixelType::CovariantVector,
            Self::Tensors => PixelType::SymmetricSecondRankTensor,
            Self::ColorScalars => PixelType::VariableLengthVector,
        }
    }

    /// Kind written for a pixel type.
    pub fn for_pixel(pixel: PixelType) -> Result<Self> {
        match pixel {
            PixelType::Scalar => Ok(Self::Scalars),
            PixelType::Vector
            | PixelType::Point
            | PixelType::Offset
            | PixelType::CovariantVector => Ok(Self::Vectors),
            PixelType::SymmetricSecondRankTensor | PixelType::DiffusionTensor3D => Ok(Self::Tensors),
            PixelType::Array
            | PixelType::VariableLengthVector
            | PixelType::Rgb
            | PixelType::Rgba => Ok(Self::ColorScalars),
            other => Err(Error::unsupported(format!(
                "{} attributes cannot be written to VTK legacy files",
                other
            ))),
        }
    }
}

/// Parsed attribute header line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeHeader {
    pub kind: AttributeKind,
    pub name: String,
    /// Type of the values on disk
    pub component_type: ComponentType,
    /// Components per tuple in memory
    pub components: usize,
}

impl AttributeHeader {
    /// Parse a header line. Returns `Ok(None)` if the line does not start
    /// with an attribute keyword.
    pub fn parse(line: &str, file_type: FileType) -> Result<Option<Self>> {
        let mut tokens = line.split_whitespace();
        let Some(kind) = tokens.next().and_then(AttributeKind::from_keyword) else {
            return Ok(None);
        };
        let name = tokens
            .next()
            .ok_or_else(|| Error::format(format!("{} header without a name", kind.keyword())))?
            .to_string();

        let header = match kind {
            AttributeKind::ColorScalars => {
                let components = parse_count(tokens.next(), kind)?;
                let component_type = match file_type {
                    FileType::Ascii => ComponentType::Float32,
                    FileType::Binary => ComponentType::Uint8,
                };
                Self { kind, name, component_type, components }
            }
            _ => {
                let type_name = tokens.next().ok_or_else(|| {
                    Error::format(format!("{} {} header without a type", kind.keyword(), name))
                })?;
                let component_type = ComponentType::from_vtk_name(type_name);
                if component_type == ComponentType::Unknown {
                    return Err(Error::unsupported(format!(
                        "VTK data type '{}' in {} {}",
                        type_name,
                        kind.keyword(),
                        name
                    )));
                }
                let components = match kind {
                    AttributeKind::Scalars => match tokens.next() {
                        Some(t) => parse_count(Some(t), kind)?,
                        None => 1,
                    },
                    AttributeKind::Tensors => 6,
                    _ => 3,
                };
                Self { kind, name, component_type, components }
            }
        };
        Ok(Some(header))
    }

    /// Values stored on disk per tuple.
    pub fn stored_components(&self) -> usize {
        match self.kind {
            AttributeKind::Tensors => 9,
            _ => self.components,
        }
    }
}

fn parse_count(token: Option<&str>, kind: AttributeKind) -> Result<usize> {
    let token = token.ok_or_else(|| {
        Error::format(format!("{} header without a component count", kind.keyword()))
    })?;
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::format(format!(
            "invalid component count '{}' in {} header",
            token,
            kind.keyword()
        ))),
    }
}

/// Whether `line` is the `LOOKUP_TABLE` line following a SCALARS header.
pub fn is_lookup_table(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|t| t.eq_ignore_ascii_case("LOOKUP_TABLE"))
}

// === Tensors ===

/// Check the in-memory component count of a symmetric tensor block.
pub fn tensor_components(components: usize) -> Result<usize> {
    match components {
        3 | 6 => Ok(components),
        n => Err(Error::unsupported(format!(
            "symmetric tensors with {} components (expected 3 or 6)",
            n
        ))),
    }
}

/// Expand packed symmetric tensors to row-major 3x3 matrices.
pub fn expand_tensors<T: Copy + Default>(packed: &[T], components: usize) -> Result<Vec<T>> {
    let components = tensor_components(components)?;
    let zero = T::default();
    let mut out = Vec::with_capacity(packed.len() / components * 9);
    for t in packed.chunks_exact(components) {
        let m = if components == 6 {
            [t[0], t[1], t[2], t[1], t[3], t[4], t[2], t[4], t[5]]
        } else {
            [t[0], t[1], zero, t[1], t[2], zero, zero, zero, zero]
        };
        out.extend_from_slice(&m);
    }
    Ok(out)
}

/// Extract the independent components of row-major 3x3 matrices into `out`.
pub fn compress_tensors<T: Copy>(full: &[T], components: usize, out: &mut [T]) -> Result<()> {
    let components = tensor_components(components)?;
    if full.len() / 9 * components != out.len() {
        return Err(Error::BufferSize { expected: full.len() / 9 * components, actual: out.len() });
    }
    for (m, t) in full.chunks_exact(9).zip(out.chunks_exact_mut(components)) {
        if components == 6 {
            t.copy_from_slice(&[m[0], m[1], m[2], m[4], m[5], m[8]]);
        } else {
            t.copy_from_slice(&[m[0], m[1], m[4]]);
        }
    }
    Ok(())
}
