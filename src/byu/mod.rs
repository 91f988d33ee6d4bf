//! Movie.BYU codec.
//!
//! A BYU file is plain text:
//!
//! ```text
//! parts points cells edges
//! first last              (one line per part, one-based cell ids)
//! x y z x y z ...         (points)
//! 1 2 -3                  (connectivity, one-based)
//! ```
//!
//! Connectivity has no per-cell counts. Each polygon ends at its first
//! negative index, whose magnitude is the last vertex. All cells read back
//! as polygons; BYU files carry no attribute data.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};

use crate::core::{
    cells, AttributeLocation, CellBufferWriter, CellClass, CellClassCounts, CellType, FileType,
    IoState, MeshIO, MeshInfo, MetaData, OStream, Session, Stage, TextStream,
};
use crate::util::{
    pad_tuples, with_buffer, Component, ComponentType, Error, MeshBuffer, Result,
};

/// Cell id range `[first, last)` of the selected part, zero-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Selection {
    first: usize,
    last: usize,
}

impl Selection {
    #[inline]
    fn contains(&self, id: usize) -> bool {
        (self.first..self.last).contains(&id)
    }
}

/// Codec for Movie.BYU `.byu` files.
pub struct ByuMeshIO {
    file_name: Option<PathBuf>,
    info: MeshInfo,
    metadata: MetaData,
    session: Session,
    part_id: Option<u32>,
    selection: Selection,
    points_offset: u64,
    cells_offset: u64,
    stream: Option<TextStream<BufReader<File>>>,
}

impl Default for ByuMeshIO {
    fn default() -> Self {
        Self::new()
    }
}

impl ByuMeshIO {
    /// Number of parts declared by the file.
    pub const PARTS_KEY: &'static str = "byu.parts";

    pub fn new() -> Self {
        Self {
            file_name: None,
            info: Self::default_info(),
            metadata: MetaData::new(),
            session: Session::new(),
            part_id: None,
            selection: Selection::default(),
            points_offset: 0,
            cells_offset: 0,
            stream: None,
        }
    }

    fn default_info() -> MeshInfo {
        MeshInfo { point_component_type: ComponentType::Float64, ..MeshInfo::default() }
    }

    /// Selected part (zero-based), `None` for all parts.
    pub fn part_id(&self) -> Option<u32> {
        self.part_id
    }

    /// Read only the cells of one part. Ids past the declared part count
    /// select every part.
    pub fn set_part_id(&mut self, part: Option<u32>) {
        self.part_id = part;
    }

    fn stream_mut(&mut self) -> Result<&mut TextStream<BufReader<File>>> {
        let state = self.session.state();
        self.stream
            .as_mut()
            .ok_or(Error::InvalidState { operation: "read from file", state })
    }

    fn destination(&self) -> Result<&Path> {
        self.file_name
            .as_deref()
            .ok_or_else(|| Error::Config("no output file name set".into()))
    }

    fn read_no_attribute(&mut self, location: AttributeLocation, buffer: &MeshBuffer) -> Result<()> {
        let stage = match location {
            AttributeLocation::Point => Stage::PointData,
            AttributeLocation::Cell => Stage::CellData,
        };
        self.session.begin_read(stage)?;
        let attr = self.info.attribute(location);
        buffer.check(attr.component_type, attr.buffer_len())
    }

    fn write_no_attribute(&mut self, stage: Stage, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(stage)?;
        if buffer.is_empty() {
            Ok(())
        } else {
            Err(Error::unsupported("BYU files carry no attribute data"))
        }
    }
}

/// Walk the header, points and connectivity of a BYU file.
fn probe<R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    part_id: Option<u32>,
    info: &mut MeshInfo,
    meta: &mut MetaData,
) -> Result<(Selection, u64, u64)> {
    let parts: usize = stream.parse_next("BYU header")?;
    let points: usize = stream.parse_next("BYU header")?;
    let total_cells: usize = stream.parse_next("BYU header")?;
    let _edges: usize = stream.parse_next("BYU header")?;

    let mut ranges = Vec::new();
    for _ in 0..parts {
        let first: usize = stream.parse_next("BYU part table")?;
        let last: usize = stream.parse_next("BYU part table")?;
        ranges.push((first, last));
    }

    let selection = match part_id.map(|p| p as usize).filter(|&p| p < parts) {
        Some(p) => {
            let (first, last) = ranges[p];
            if first == 0 || first - 1 > last || last > total_cells {
                return Err(Error::format(format!(
                    "part {} spans cells {}..{} of {}",
                    p, first, last, total_cells
                )));
            }
            Selection { first: first - 1, last }
        }
        None => Selection { first: 0, last: total_cells },
    };

    let points_offset = stream.position();
    let coordinates = points
        .checked_mul(3)
        .ok_or_else(|| Error::format(format!("BYU point count {} is too large", points)))?;
    stream.skip_tokens(coordinates, "BYU points")?;
    let cells_offset = stream.position();

    // count connectivity tokens of the selected cells
    let mut tokens = 0;
    let mut id = 0;
    while id < selection.last {
        let v: i64 = stream.parse_next("BYU connectivity")?;
        if v == 0 {
            return Err(Error::format("BYU connectivity contains index 0"));
        }
        if selection.contains(id) {
            tokens += 1;
        }
        if v < 0 {
            id += 1;
        }
    }

    let cells = selection.last - selection.first;
    *info = MeshInfo {
        file_type: FileType::Ascii,
        point_dimension: 3,
        number_of_points: points,
        point_component_type: ComponentType::Float64,
        number_of_cells: cells,
        cell_buffer_size: tokens + 2 * cells,
        cell_component_type: ComponentType::Uint32,
        ..MeshInfo::default()
    };

    let mut counts = CellClassCounts::default();
    counts.add_section(CellClass::Polygon, cells, tokens + cells);
    counts.store(meta);
    meta.set_value(ByuMeshIO::PARTS_KEY, parts);
    Ok((selection, points_offset, cells_offset))
}

/// Decode the connectivity of the selected cells into `out`.
fn read_connectivity<T: Component, R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    selection: Selection,
    points: usize,
    out: &mut [T],
) -> Result<usize> {
    let mut writer = CellBufferWriter::new(out);
    let mut id = 0;
    while id < selection.last {
        let v: i64 = stream.parse_next("BYU connectivity")?;
        let (index, closes) = match v {
            v if v > 0 => (v - 1, false),
            v if v < 0 => (-v - 1, true),
            _ => return Err(Error::format("BYU connectivity contains index 0")),
        };
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i < points)
            .ok_or_else(|| {
                Error::format(format!("BYU vertex {} is out of range for {} points", v, points))
            })?;
        if selection.contains(id) {
            writer.push_index(index)?;
            if closes {
                writer.end_cell(CellType::Polygon)?;
            }
        }
        if closes {
            id += 1;
        }
    }
    writer.finish()
}

/// One polygon per line, one-based, last index negated.
fn write_connectivity<T: Component>(out: &mut OStream, data: &[T]) -> Result<usize> {
    let mut written = 0;
    let mut line: Vec<i64> = Vec::new();
    for cell in cells(data) {
        let cell = cell?;
        line.clear();
        for &p in cell.points.iter() {
            let v = i64::try_from(p + 1)
                .map_err(|_| Error::format(format!("BYU vertex index {} is too large", p)))?;
            line.push(v);
        }
        let last = line.last_mut().ok_or_else(|| {
            Error::format(format!("{} cell without vertices cannot be written to BYU", cell.cell_type))
        })?;
        *last = -*last;
        out.write_text_values(&line, line.len())?;
        written += 1;
    }
    Ok(written)
}

impl MeshIO for ByuMeshIO {
    fn format_name(&self) -> &'static str {
        "byu"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["byu"]
    }

    fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    fn set_file_name(&mut self, path: &Path) {
        self.reset();
        self.file_name = Some(path.to_path_buf());
    }

    fn info(&self) -> &MeshInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MeshInfo {
        &mut self.info
    }

    fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut MetaData {
        &mut self.metadata
    }

    fn state(&self) -> IoState {
        self.session.state()
    }

    fn read_mesh_information(&mut self) -> Result<()> {
        self.session.begin_probe()?;
        let path = self
            .file_name
            .clone()
            .ok_or_else(|| Error::Config("no input file name set".into()))?;

        let mut stream = TextStream::open(&path)?;
        let mut info = Self::default_info();
        let mut metadata = MetaData::new();
        let (selection, points_offset, cells_offset) =
            probe(&mut stream, self.part_id, &mut info, &mut metadata)?;

        tracing::debug!(
            path = %path.display(),
            points = info.number_of_points,
            cells = info.number_of_cells,
            cell_buffer = info.cell_buffer_size,
            part = ?self.part_id,
            "probed BYU file"
        );
        self.info = info;
        self.metadata = metadata;
        self.selection = selection;
        self.points_offset = points_offset;
        self.cells_offset = cells_offset;
        self.stream = Some(stream);
        self.session.finish_probe();
        Ok(())
    }

    fn read_points(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.session.begin_read(Stage::Points)?;
        buffer.check(self.info.point_component_type, self.info.points_len())?;
        let offset = self.points_offset;
        let stream = self.stream_mut()?;
        stream.seek_to(offset)?;
        with_buffer!(buffer, data => stream.read_values(data.as_mut_slice(), "BYU points"))
    }

    fn read_cells(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.session.begin_read(Stage::Cells)?;
        buffer.check(self.info.cell_component_type, self.info.cell_buffer_size)?;
        let offset = self.cells_offset;
        let selection = self.selection;
        let points = self.info.number_of_points;
        let stream = self.stream_mut()?;
        stream.seek_to(offset)?;
        let cells = with_buffer!(buffer, data => {
            read_connectivity(stream, selection, points, data.as_mut_slice())
        })?;
        tracing::debug!(cells, "read BYU cells");
        Ok(())
    }

    fn read_point_data(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.read_no_attribute(AttributeLocation::Point, buffer)
    }

    fn read_cell_data(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.read_no_attribute(AttributeLocation::Cell, buffer)
    }

    fn write_mesh_information(&mut self) -> Result<()> {
        self.session.begin_header()?;
        let path = self.destination()?;
        let points = self.info.number_of_points;
        let cells = self.info.number_of_cells;
        let edges = self.info.cell_buffer_size.saturating_sub(2 * cells);

        let mut out = OStream::create(path)?;
        out.write_line(format_args!("{:8}{:8}{:8}{:8}", 1, points, cells, edges))?;
        out.write_line(format_args!("{:8}{:8}", 1, cells))?;
        out.flush()?;
        tracing::debug!(path = %path.display(), points, cells, "wrote BYU header");

        self.stream = None;
        self.session.finish_header();
        Ok(())
    }

    fn write_points(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(Stage::Points)?;
        let dimension = self.info.point_dimension;
        if buffer.len() != self.info.points_len() {
            return Err(Error::BufferSize { expected: self.info.points_len(), actual: buffer.len() });
        }
        let mut out = OStream::append(self.destination()?)?;
        with_buffer!(buffer, data => {
            let padded = pad_tuples(data, dimension, 3).ok_or_else(|| {
                Error::unsupported(format!("{}-dimensional points in a BYU file", dimension))
            })?;
            // two points per line
            out.write_text_values(&*padded, 6)
        })?;
        out.flush()
    }

    fn write_cells(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(Stage::Cells)?;
        if buffer.len() != self.info.cell_buffer_size {
            return Err(Error::BufferSize {
                expected: self.info.cell_buffer_size,
                actual: buffer.len(),
            });
        }
        let mut out = OStream::append(self.destination()?)?;
        let cells = with_buffer!(buffer, data => write_connectivity(&mut out, data))?;
        out.flush()?;
        tracing::debug!(cells, "wrote BYU cells");
        Ok(())
    }

    fn write_point_data(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.write_no_attribute(Stage::PointData, buffer)
    }

    fn write_cell_data(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.write_no_attribute(Stage::CellData, buffer)
    }

    fn close(&mut self) {
        self.stream = None;
        self.session.close();
    }

    fn reset(&mut self) {
        self.stream = None;
        self.selection = Selection::default();
        self.info = Self::default_info();
        self.metadata.clear();
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_PARTS: &str = "2 4 3 9\n1 2\n3 3\n\
        0 0 0 1 0 0\n1 1 0 0 1 0\n\
        1 2 -3\n1 3 -4\n2 3 4 -1\n";

    fn probe_str(text: &str, part: Option<u32>) -> Result<(MeshInfo, MetaData, Selection)> {
        let mut stream = TextStream::new(Cursor::new(text.as_bytes().to_vec()))?;
        let mut info = MeshInfo::default();
        let mut meta = MetaData::new();
        let (selection, _, _) = probe(&mut stream, part, &mut info, &mut meta)?;
        Ok((info, meta, selection))
    }

    #[test]
    fn test_probe_all_parts() -> Result<()> {
        let (info, meta, selection) = probe_str(TWO_PARTS, None)?;
        assert_eq!(info.number_of_points, 4);
        assert_eq!(info.point_component_type, ComponentType::Float64);
        assert_eq!(info.number_of_cells, 3);
        assert_eq!(info.cell_buffer_size, 10 + 6);
        assert_eq!(selection, Selection { first: 0, last: 3 });
        assert_eq!(meta.get_parsed::<usize>(ByuMeshIO::PARTS_KEY), Some(2));
        assert_eq!(meta.get_parsed::<usize>(MetaData::POLYGONS_KEY), Some(3));
        Ok(())
    }

    #[test]
    fn test_probe_selected_part() -> Result<()> {
        let (info, _, selection) = probe_str(TWO_PARTS, Some(1))?;
        assert_eq!(selection, Selection { first: 2, last: 3 });
        assert_eq!(info.number_of_cells, 1);
        assert_eq!(info.cell_buffer_size, 4 + 2);

        // out-of-range part ids select everything
        let (info, _, _) = probe_str(TWO_PARTS, Some(7))?;
        assert_eq!(info.number_of_cells, 3);
        Ok(())
    }

    #[test]
    fn test_oversized_header_counts() {
        let parts = probe_str("2000000000000000000 4 3 9\n1 2\n", None);
        assert!(matches!(parts, Err(Error::Format(_))));

        let points = probe_str("1 9223372036854775807 1 3\n1 1\n0 0 0\n", None);
        let err = points.unwrap_err();
        assert!(err.to_string().contains("too large"));

        let span = probe_str("1 3 1 3\n1 18446744073709551615\n", Some(0));
        assert!(matches!(span, Err(Error::Format(_))));
    }

    #[test]
    fn test_read_connectivity_rebases() -> Result<()> {
        let mut stream = TextStream::new(Cursor::new(b"1 2 -3 2 3 -4".to_vec()))?;
        let mut out = vec![0u32; 10];
        let cells = read_connectivity(&mut stream, Selection { first: 0, last: 2 }, 4, &mut out)?;
        assert_eq!(cells, 2);
        assert_eq!(out, vec![4, 3, 0, 1, 2, 4, 3, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_read_connectivity_errors() {
        let mut stream = TextStream::new(Cursor::new(b"1 0 -3".to_vec())).unwrap();
        let mut out = vec![0u32; 5];
        let sel = Selection { first: 0, last: 1 };
        assert!(matches!(read_connectivity(&mut stream, sel, 4, &mut out), Err(Error::Format(_))));

        let mut stream = TextStream::new(Cursor::new(b"1 2 -9".to_vec())).unwrap();
        assert!(matches!(read_connectivity(&mut stream, sel, 4, &mut out), Err(Error::Format(_))));

        let mut stream = TextStream::new(Cursor::new(b"1 2".to_vec())).unwrap();
        assert!(matches!(read_connectivity(&mut stream, sel, 4, &mut out), Err(Error::Format(_))));
    }

    #[test]
    fn test_probe_rejects_zero_index() {
        let text = "1 3 1 3\n1 1\n0 0 0 1 0 0 0 1 0\n1 0 -3\n";
        assert!(matches!(probe_str(text, None), Err(Error::Format(_))));
    }
}
