//! In-memory mesh and the read/write orchestration around [`MeshIO`].
//!
//! [`MeshData::read_from`] probes a codec, allocates every buffer at exactly
//! the size the probe reported and materializes the sections in order.
//! [`MeshData::write_to`] hands the counts to a codec and writes them back.

use crate::core::{AttributeLocation, MeshIO, MeshInfo, MetaData};
use crate::util::{MeshBuffer, Result};

/// A whole mesh: points, flat cell buffer, optional attribute blocks.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub info: MeshInfo,
    pub points: MeshBuffer,
    pub cells: MeshBuffer,
    pub point_data: Option<MeshBuffer>,
    pub cell_data: Option<MeshBuffer>,
    pub metadata: MetaData,
}

impl MeshData {
    /// Probe and materialize everything `io` can provide.
    ///
    /// The codec must have its file name set and be unopened. It is closed
    /// on success.
    pub fn read_from(io: &mut dyn MeshIO) -> Result<Self> {
        io.read_mesh_information()?;
        let info = io.info().clone();

        let mut points = MeshBuffer::zeroed(info.point_component_type, info.points_len())?;
        io.read_points(&mut points)?;

        let mut cells = MeshBuffer::zeroed(info.cell_component_type, info.cell_buffer_size)?;
        io.read_cells(&mut cells)?;

        let point_data = read_attribute(io, &info, AttributeLocation::Point)?;
        let cell_data = read_attribute(io, &info, AttributeLocation::Cell)?;

        let metadata = io.metadata().clone();
        io.close();
        tracing::debug!(
            format = io.format_name(),
            points = info.number_of_points,
            cells = info.number_of_cells,
            "read mesh"
        );
        Ok(Self { info, points, cells, point_data, cell_data, metadata })
    }

    /// Write every section to `io`, which must have its file name set.
    ///
    /// The codec's info and metadata are replaced by this mesh's.
    pub fn write_to(&self, io: &mut dyn MeshIO) -> Result<()> {
        *io.info_mut() = self.info.clone();
        *io.metadata_mut() = self.metadata.clone();

        io.write_mesh_information()?;
        io.write_points(&self.points)?;
        io.write_cells(&self.cells)?;
        if let Some(data) = &self.point_data {
            io.write_point_data(data)?;
        }
        if let Some(data) = &self.cell_data {
            io.write_cell_data(data)?;
        }
        io.close();
        tracing::debug!(format = io.format_name(), file_type = %self.info.file_type, "wrote mesh");
        Ok(())
    }

    /// Drop both attribute blocks, e.g. before writing to a format that has none.
    pub fn clear_attributes(&mut self) {
        self.point_data = None;
        self.cell_data = None;
        self.info.point_data.count = 0;
        self.info.cell_data.count = 0;
    }

    /// True if either attribute block is present.
    pub fn has_attributes(&self) -> bool {
        self.point_data.is_some() || self.cell_data.is_some()
    }
}

fn read_attribute(
    io: &mut dyn MeshIO,
    info: &MeshInfo,
    location: AttributeLocation,
) -> Result<Option<MeshBuffer>> {
    let attr = info.attribute(location);
    if attr.buffer_len() == 0 {
        return Ok(None);
    }
    let mut buffer = MeshBuffer::zeroed(attr.component_type, attr.buffer_len())?;
    match location {
        AttributeLocation::Point => io.read_point_data(&mut buffer)?,
        AttributeLocation::Cell => io.read_cell_data(&mut buffer)?,
    }
    Ok(Some(buffer))
}
