//! Probe results: counts and type tags that size the caller's buffers.

use std::fmt;

use crate::util::{ComponentType, PixelType};

/// Encoding of a mesh file's payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Whitespace-separated text numbers
    #[default]
    Ascii,
    /// Fixed-width values in the codec's wire byte order
    Binary,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii => write!(f, "ASCII"),
            Self::Binary => write!(f, "BINARY"),
        }
    }
}

/// Where an attribute block is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeLocation {
    /// One tuple per point
    Point,
    /// One tuple per cell
    Cell,
}

impl AttributeLocation {
    /// Lower-case name, used in metadata keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Cell => "cell",
        }
    }
}

/// Description of one attribute block (point data or cell data).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Semantic shape of one tuple
    pub pixel_type: PixelType,
    /// Type of each component
    pub component_type: ComponentType,
    /// Components per tuple
    pub components: usize,
    /// Number of tuples
    pub count: usize,
}

impl AttributeInfo {
    /// Total number of components in the block.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.count * self.components
    }
}

impl Default for AttributeInfo {
    fn default() -> Self {
        Self {
            pixel_type: PixelType::Scalar,
            component_type: ComponentType::Float32,
            components: 1,
            count: 0,
        }
    }
}

/// Everything a probe pass learns about a mesh file, and everything a
/// writer needs to be told before encoding one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshInfo {
    /// Encoding of the file
    pub file_type: FileType,
    /// Components per point
    pub point_dimension: usize,
    /// Number of points
    pub number_of_points: usize,
    /// Component type of point coordinates
    pub point_component_type: ComponentType,
    /// Number of cells
    pub number_of_cells: usize,
    /// Length of the flat cell buffer
    pub cell_buffer_size: usize,
    /// Component type of the flat cell buffer
    pub cell_component_type: ComponentType,
    /// Per-point attribute block
    pub point_data: AttributeInfo,
    /// Per-cell attribute block
    pub cell_data: AttributeInfo,
}

impl MeshInfo {
    /// Total number of point coordinate components.
    #[inline]
    pub fn points_len(&self) -> usize {
        self.number_of_points * self.point_dimension
    }

    /// Attribute description at `location`.
    pub fn attribute(&self, location: AttributeLocation) -> &AttributeInfo {
        match location {
            AttributeLocation::Point => &self.point_data,
            AttributeLocation::Cell => &self.cell_data,
        }
    }

    /// Mutable attribute description at `location`.
    pub fn attribute_mut(&mut self, location: AttributeLocation) -> &mut AttributeInfo {
        match location {
            AttributeLocation::Point => &mut self.point_data,
            AttributeLocation::Cell => &mut self.cell_data,
        }
    }
}

impl Default for MeshInfo {
    fn default() -> Self {
        Self {
            file_type: FileType::Ascii,
            point_dimension: 3,
            number_of_points: 0,
            point_component_type: ComponentType::Float32,
            number_of_cells: 0,
            cell_buffer_size: 0,
            cell_component_type: ComponentType::Uint32,
            point_data: AttributeInfo::default(),
            cell_data: AttributeInfo::default(),
        }
    }
}
