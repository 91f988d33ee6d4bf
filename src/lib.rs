//! # meshio
//!
//! Readers and writers for polygonal mesh files.
//!
//! Every format is a [`core::MeshIO`] codec with the same two-phase
//! lifecycle: a probe pass that reports counts and component types without
//! reading payload, then materialize calls that fill caller buffers sized
//! exactly from the probe results.
//!
//! ## Modules
//!
//! - [`util`] - Component types, typed buffers, errors
//! - [`core`] - Codec contract, flat cell buffer, polyline chaining, streams
//! - [`vtk`] - VTK legacy POLYDATA, ASCII and BINARY
//! - [`byu`] - Movie.BYU
//! - [`mesh_data`] - Whole-mesh read/write helper
//!
//! ## Example
//!
//! ```ignore
//! use meshio::prelude::*;
//!
//! let mut reader = VtkPolyDataMeshIO::new();
//! reader.set_file_name("bunny.vtk".as_ref());
//! let mesh = MeshData::read_from(&mut reader)?;
//!
//! let mut writer = ByuMeshIO::new();
//! writer.set_file_name("bunny.byu".as_ref());
//! mesh.write_to(&mut writer)?;
//! ```

use std::path::Path;

pub mod util;
pub mod core;
pub mod vtk;
pub mod byu;
pub mod mesh_data;

// Re-export commonly used types
pub use util::{ComponentType, Error, MeshBuffer, PixelType, Result};
pub use mesh_data::MeshData;

/// Pick a codec from the extension of `path`.
///
/// The returned codec already has its file name set.
pub fn codec_for_path(path: &Path) -> Result<Box<dyn crate::core::MeshIO>> {
    let candidates: [Box<dyn crate::core::MeshIO>; 2] =
        [Box::new(vtk::VtkPolyDataMeshIO::new()), Box::new(byu::ByuMeshIO::new())];
    let mut codec = candidates
        .into_iter()
        .find(|c| c.can_write(path))
        .ok_or_else(|| Error::unsupported(format!("no mesh codec for {}", path.display())))?;
    codec.set_file_name(path);
    Ok(codec)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{ComponentType, Endianness, Error, MeshBuffer, PixelType, Result};
    pub use crate::core::{
        AttributeInfo, AttributeLocation, CellType, FileType, IoState, MeshIO, MeshInfo, MetaData,
    };
    pub use crate::vtk::VtkPolyDataMeshIO;
    pub use crate::byu::ByuMeshIO;
    pub use crate::mesh_data::MeshData;
    pub use crate::codec_for_path;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_for_path() {
        let codec = codec_for_path(Path::new("mesh.VTK")).unwrap();
        assert_eq!(codec.format_name(), "vtk");
        assert_eq!(codec.file_name(), Some(Path::new("mesh.VTK")));

        let codec = codec_for_path(Path::new("part.byu")).unwrap();
        assert_eq!(codec.format_name(), "byu");

        assert!(matches!(codec_for_path(Path::new("mesh.obj")), Err(Error::UnsupportedType(_))));
    }
}
