//! PixelType - the semantic shape of one attribute tuple.

use std::fmt;

/// Pixel type tag of an attribute block.
///
/// Together with a [`ComponentType`](super::ComponentType) and a component
/// count this describes how a per-point or per-cell attribute is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// One value per entity
    #[default]
    Scalar,
    /// Red, green, blue
    Rgb,
    /// Red, green, blue, alpha
    Rgba,
    /// Displacement between points
    Offset,
    /// Geometric vector
    Vector,
    /// Point coordinates
    Point,
    /// Gradient-like vector
    CovariantVector,
    /// Symmetric second rank tensor (3 or 6 independent components)
    SymmetricSecondRankTensor,
    /// Diffusion tensor, stored like a 3D symmetric tensor
    DiffusionTensor3D,
    /// Complex number
    Complex,
    /// Fixed-length array
    FixedArray,
    /// Array of arbitrary arity
    Array,
    /// Dense matrix
    Matrix,
    /// Per-tuple vector whose arity is only known at run time
    VariableLengthVector,
    /// Per-tuple matrix whose shape is only known at run time
    VariableSizeMatrix,
    /// Unknown/invalid type
    Unknown,
}

impl PixelType {
    /// Returns the name of this pixel type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Rgb => "rgb",
            Self::Rgba => "rgba",
            Self::Offset => "offset",
            Self::Vector => "vector",
            Self::Point => "point",
            Self::CovariantVector => "covariant_vector",
            Self::SymmetricSecondRankTensor => "symmetric_second_rank_tensor",
            Self::DiffusionTensor3D => "diffusion_tensor_3d",
            Self::Complex => "complex",
            Self::FixedArray => "fixed_array",
            Self::Array => "array",
            Self::Matrix => "matrix",
            Self::VariableLengthVector => "variable_length_vector",
            Self::VariableSizeMatrix => "variable_size_matrix",
            Self::Unknown => "unknown",
        }
    }

    /// Number of components per tuple implied by the pixel type for the
    /// given point dimension, or `None` when the arity is explicit.
    pub const fn implied_components(self, dimension: usize) -> Option<usize> {
        match self {
            Self::Scalar => Some(1),
            Self::Rgb => Some(3),
            Self::Rgba => Some(4),
            Self::Complex => Some(2),
            Self::Offset | Self::Vector | Self::Point | Self::CovariantVector => Some(dimension),
            Self::SymmetricSecondRankTensor | Self::DiffusionTensor3D => {
                Some(dimension * (dimension + 1) / 2)
            }
            _ => None,
        }
    }

    /// Returns true for the tensor pixel types.
    pub const fn is_tensor(self) -> bool {
        matches!(self, Self::SymmetricSecondRankTensor | Self::DiffusionTensor3D)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_components() {
        assert_eq!(PixelType::Scalar.implied_components(3), Some(1));
        assert_eq!(PixelType::Vector.implied_components(3), Some(3));
        assert_eq!(PixelType::Vector.implied_components(2), Some(2));
        assert_eq!(PixelType::SymmetricSecondRankTensor.implied_components(3), Some(6));
        assert_eq!(PixelType::SymmetricSecondRankTensor.implied_components(2), Some(3));
        assert_eq!(PixelType::VariableLengthVector.implied_components(3), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PixelType::CovariantVector.to_string(), "covariant_vector");
        assert!(PixelType::DiffusionTensor3D.is_tensor());
        assert!(!PixelType::Vector.is_tensor());
    }
}
