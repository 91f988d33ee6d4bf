//! The mesh codec contract.
//!
//! A codec reads in two phases: a cheap probe
//! ([`read_mesh_information`](MeshIO::read_mesh_information)) that fills
//! [`MeshInfo`] without touching payload, then materialize calls that fill
//! caller buffers sized exactly from that info. Writing mirrors it: the
//! caller fills [`MeshInfo`] and [`MetaData`], writes the header, then
//! appends each section in order.

use std::path::Path;

use crate::core::{IoState, MeshInfo, MetaData};
use crate::util::{MeshBuffer, Result};

/// Reader/writer interface for one mesh file format.
pub trait MeshIO: Send {
    /// Short format name, e.g. `"vtk"`.
    fn format_name(&self) -> &'static str;

    /// Lower-case file extensions (without the dot) handled by this codec.
    fn extensions(&self) -> &'static [&'static str];

    /// True if `path` exists and has one of [`extensions`](Self::extensions).
    /// Never fails.
    fn can_read(&self, path: &Path) -> bool {
        path.is_file() && self.can_write(path)
    }

    /// True if `path` has one of [`extensions`](Self::extensions).
    fn can_write(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions().iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    // === Configuration ===

    /// Current source/destination path.
    fn file_name(&self) -> Option<&Path>;

    /// Set the source/destination path. Resets the codec.
    fn set_file_name(&mut self, path: &Path);

    /// Counts and type tags (probe results, or writer settings).
    fn info(&self) -> &MeshInfo;

    /// Mutable counts and type tags.
    fn info_mut(&mut self) -> &mut MeshInfo;

    /// Metadata side store.
    fn metadata(&self) -> &MetaData;

    /// Mutable metadata side store.
    fn metadata_mut(&mut self) -> &mut MetaData;

    /// Lifecycle state.
    fn state(&self) -> IoState;

    // === Reading ===

    /// Probe the file: fill [`info`](Self::info) and the metadata without
    /// reading payload. Only valid on an unopened codec.
    fn read_mesh_information(&mut self) -> Result<()>;

    /// Fill `buffer` with point coordinates.
    fn read_points(&mut self, buffer: &mut MeshBuffer) -> Result<()>;

    /// Fill `buffer` with the flat cell encoding.
    fn read_cells(&mut self, buffer: &mut MeshBuffer) -> Result<()>;

    /// Fill `buffer` with the per-point attribute block.
    fn read_point_data(&mut self, buffer: &mut MeshBuffer) -> Result<()>;

    /// Fill `buffer` with the per-cell attribute block.
    fn read_cell_data(&mut self, buffer: &mut MeshBuffer) -> Result<()>;

    // === Writing ===

    /// Create or truncate the destination and write the file header.
    fn write_mesh_information(&mut self) -> Result<()>;

    /// Append point coordinates.
    fn write_points(&mut self, buffer: &MeshBuffer) -> Result<()>;

    /// Append cells from a flat cell buffer.
    fn write_cells(&mut self, buffer: &MeshBuffer) -> Result<()>;

    /// Append the per-point attribute block.
    fn write_point_data(&mut self, buffer: &MeshBuffer) -> Result<()>;

    /// Append the per-cell attribute block.
    fn write_cell_data(&mut self, buffer: &MeshBuffer) -> Result<()>;

    // === Lifecycle ===

    /// Release file handles.
    fn close(&mut self);

    /// Return to the unopened state and clear the metadata.
    fn reset(&mut self);
}
