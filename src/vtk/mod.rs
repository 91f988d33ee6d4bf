//! VTK legacy `POLYDATA` codec, ASCII and BINARY.
//!
//! Layout of a file:
//!
//! ```text
//! # vtk DataFile Version 3.0
//! title
//! ASCII | BINARY
//! DATASET POLYDATA
//! POINTS n type
//! ...payload...
//! VERTICES n size      (each cell: count v0 v1 ...)
//! LINES n size
//! POLYGONS n size
//! POINT_DATA n
//! SCALARS|VECTORS|NORMALS|TENSORS|COLOR_SCALARS ...
//! CELL_DATA n
//! ...
//! ```
//!
//! In BINARY files every payload is a run of fixed-width values in the wire
//! byte order (big-endian unless configured otherwise), followed by one line
//! break. Cell lists are always 32-bit signed integers.
//!
//! Reading decodes each cell section into the flat cell buffer, tagging its
//! cells with the section's class. Writing splits the flat buffer back into
//! classes, chaining line segments into polylines on the way, and stores the
//! emitted class totals in the metadata.

mod attribute;
mod header;

pub use attribute::{
    compress_tensors, expand_tensors, tensor_components, AttributeHeader, AttributeKind,
};

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};

use crate::core::{
    chain_cells, class_cells, encode_class, AttributeInfo, AttributeLocation, CellBufferWriter,
    CellClass, CellClassCounts, CellPoints, FileType, IoState, MeshIO, MeshInfo, MetaData,
    OStream, Session, Stage, TextStream,
};
use crate::util::{
    pad_tuples, with_buffer, Component, ComponentType, Endianness, Error, MeshBuffer, PixelType,
    Result,
};

use header::{parse_field, Layout};

/// Title written when the metadata carries none.
pub const DEFAULT_TITLE: &str = "File written by meshio";

const fn block_keyword(location: AttributeLocation) -> &'static str {
    match location {
        AttributeLocation::Point => "POINT_DATA",
        AttributeLocation::Cell => "CELL_DATA",
    }
}

const fn stage_of(location: AttributeLocation) -> Stage {
    match location {
        AttributeLocation::Point => Stage::PointData,
        AttributeLocation::Cell => Stage::CellData,
    }
}

/// Codec for VTK legacy `.vtk` polygonal data files.
pub struct VtkPolyDataMeshIO {
    file_name: Option<PathBuf>,
    info: MeshInfo,
    metadata: MetaData,
    session: Session,
    byte_order: Endianness,
    layout: Layout,
    stream: Option<TextStream<BufReader<File>>>,
}

impl Default for VtkPolyDataMeshIO {
    fn default() -> Self {
        Self::new()
    }
}

impl VtkPolyDataMeshIO {
    pub fn new() -> Self {
        Self {
            file_name: None,
            info: MeshInfo::default(),
            metadata: MetaData::new(),
            session: Session::new(),
            byte_order: Endianness::Big,
            layout: Layout::default(),
            stream: None,
        }
    }

    /// Wire byte order of BINARY payloads.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Set the wire byte order used for BINARY payloads (default big-endian).
    pub fn set_byte_order(&mut self, order: Endianness) {
        self.byte_order = order;
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

    fn read_attribute(&mut self, location: AttributeLocation, buffer: &mut MeshBuffer) -> Result<()> {
        self.session.begin_read(stage_of(location))?;
        let attr = *self.info.attribute(location);
        buffer.check(attr.component_type, attr.buffer_len())?;
        if attr.count == 0 {
            return Ok(());
        }
        let section = self.layout.attribute(location).cloned().ok_or_else(|| {
            Error::format(format!("file has no {} attribute data", location.name()))
        })?;
        let file_type = self.info.file_type;
        let order = self.byte_order;
        let stream = self.stream_mut()?;

        let kind = section.header.kind;
        stream.read_section(section.offset, kind.keyword())?;
        if kind == AttributeKind::Scalars {
            match stream.read_line()? {
                Some(line) if attribute::is_lookup_table(&line) => {}
                _ => {
                    return Err(Error::format(format!(
                        "SCALARS {} is missing its LOOKUP_TABLE line",
                        section.header.name
                    )))
                }
            }
        }

        with_buffer!(buffer, data => {
            read_attribute_payload(stream, &section.header, &attr, file_type, order, data)
        })?;
        tracing::debug!(
            location = location.name(),
            kind = kind.label(),
            count = attr.count,
            "read attribute data"
        );
        Ok(())
    }

    fn write_attribute(&mut self, location: AttributeLocation, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(stage_of(location))?;
        let attr = *self.info.attribute(location);
        if attr.count == 0 && buffer.is_empty() {
            return Ok(());
        }
        if buffer.len() != attr.buffer_len() {
            return Err(Error::BufferSize { expected: attr.buffer_len(), actual: buffer.len() });
        }
        let kind = AttributeKind::for_pixel(attr.pixel_type)?;
        let name = self
            .metadata
            .data_name(location, kind.label())
            .or_else(|| match attr.pixel_type {
                PixelType::CovariantVector => {
                    self.metadata.data_name(location, AttributeKind::Normals.label())
                }
                _ => None,
            })
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join("_"))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| kind.label().to_string());
        let file_type = self.info.file_type;
        let order = self.byte_order;

        let mut out = OStream::append(self.destination()?)?;
        out.write_line(format_args!("{} {}", block_keyword(location), attr.count))?;
        with_buffer!(buffer, data => {
            write_attribute_payload(&mut out, kind, &name, &attr, file_type, order, data)
        })?;
        out.flush()?;
        tracing::debug!(
            location = location.name(),
            kind = kind.label(),
            name = %name,
            count = attr.count,
            "wrote attribute data"
        );
        Ok(())
    }
}

impl MeshIO for VtkPolyDataMeshIO {
    fn format_name(&self) -> &'static str {
        "vtk"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["vtk"]
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
        let mut info = MeshInfo::default();
        let mut metadata = MetaData::new();
        let layout = header::probe(&mut stream, &mut info, &mut metadata)?;

        tracing::debug!(
            path = %path.display(),
            file_type = %info.file_type,
            points = info.number_of_points,
            cells = info.number_of_cells,
            cell_buffer = info.cell_buffer_size,
            "probed VTK file"
        );
        self.info = info;
        self.metadata = metadata;
        self.layout = layout;
        self.stream = Some(stream);
        self.session.finish_probe();
        Ok(())
    }

    fn read_points(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.session.begin_read(Stage::Points)?;
        buffer.check(self.info.point_component_type, self.info.points_len())?;
        let offset = self.layout.points.ok_or_else(|| Error::format("missing POINTS section"))?;
        let wire = self.layout.point_type;
        let file_type = self.info.file_type;
        let order = self.byte_order;
        let stream = self.stream_mut()?;

        stream.read_section(offset, "POINTS")?;
        with_buffer!(buffer, data => read_payload(stream, file_type, wire, order, data, "POINTS"))?;
        tracing::debug!(values = buffer.len(), "read points");
        Ok(())
    }

    fn read_cells(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.session.begin_read(Stage::Cells)?;
        buffer.check(self.info.cell_component_type, self.info.cell_buffer_size)?;
        let classes = self.layout.classes.clone();
        let file_type = self.info.file_type;
        let order = self.byte_order;
        let points = self.info.number_of_points;
        let stream = self.stream_mut()?;

        let cells = with_buffer!(buffer, data => {
            read_cell_sections(stream, &classes, file_type, order, points, data)
        })?;
        tracing::debug!(cells, "read cells");
        Ok(())
    }

    fn read_point_data(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.read_attribute(AttributeLocation::Point, buffer)
    }

    fn read_cell_data(&mut self, buffer: &mut MeshBuffer) -> Result<()> {
        self.read_attribute(AttributeLocation::Cell, buffer)
    }

    fn write_mesh_information(&mut self) -> Result<()> {
        self.session.begin_header()?;
        let path = self.destination()?;
        let title = self
            .metadata
            .title()
            .map(|t| t.lines().next().unwrap_or("").trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        let mut out = OStream::create(path)?;
        out.write_bytes(header::preamble(title, self.info.file_type).as_bytes())?;
        out.flush()?;
        tracing::debug!(path = %path.display(), file_type = %self.info.file_type, "wrote VTK header");

        self.stream = None;
        self.layout = Layout::default();
        self.session.finish_header();
        Ok(())
    }

    fn write_points(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(Stage::Points)?;
        let dimension = self.info.point_dimension;
        if buffer.len() != self.info.points_len() {
            return Err(Error::BufferSize { expected: self.info.points_len(), actual: buffer.len() });
        }
        if !(1..=3).contains(&dimension) {
            return Err(Error::unsupported(format!(
                "{}-dimensional points in a VTK file",
                dimension
            )));
        }
        let points = self.info.number_of_points;
        let file_type = self.info.file_type;
        let order = self.byte_order;

        let mut out = OStream::append(self.destination()?)?;
        with_buffer!(buffer, data => {
            write_point_payload(&mut out, data, points, dimension, file_type, order)
        })?;
        out.flush()?;
        tracing::debug!(points, "wrote points");
        Ok(())
    }

    fn write_cells(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.session.begin_write(Stage::Cells)?;
        if buffer.len() != self.info.cell_buffer_size {
            return Err(Error::BufferSize {
                expected: self.info.cell_buffer_size,
                actual: buffer.len(),
            });
        }
        let file_type = self.info.file_type;
        let order = self.byte_order;

        let mut out = OStream::append(self.destination()?)?;
        let counts = with_buffer!(buffer, data => write_cell_sections(&mut out, data, file_type, order))?;
        out.flush()?;
        counts.store(&mut self.metadata);
        tracing::debug!(
            vertices = counts.vertices,
            lines = counts.lines,
            polygons = counts.polygons,
            "wrote cells"
        );
        Ok(())
    }

    fn write_point_data(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.write_attribute(AttributeLocation::Point, buffer)
    }

    fn write_cell_data(&mut self, buffer: &MeshBuffer) -> Result<()> {
        self.write_attribute(AttributeLocation::Cell, buffer)
    }

    fn close(&mut self) {
        self.stream = None;
        self.session.close();
    }

    fn reset(&mut self) {
        self.stream = None;
        self.layout = Layout::default();
        self.info = MeshInfo::default();
        self.metadata.clear();
        self.session.reset();
    }
}

// === Reading ===

/// Read `out.len()` values stored as `wire` into `out`.
fn read_payload<T: Component, R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    file_type: FileType,
    wire: ComponentType,
    order: Endianness,
    out: &mut [T],
    what: &str,
) -> Result<()> {
    match file_type {
        FileType::Ascii => stream.read_values(out, what),
        FileType::Binary => {
            if wire == T::COMPONENT_TYPE {
                stream.read_range(out, order, what)?;
            } else {
                let mut scratch = MeshBuffer::zeroed(wire, out.len())?;
                with_buffer!(&mut scratch, w => stream.read_range(w.as_mut_slice(), order, what))?;
                scratch.cast_into(out)?;
            }
            stream.skip_line_break()
        }
    }
}

fn check_index(value: i64, points: usize, what: &str) -> Result<usize> {
    match usize::try_from(value) {
        Ok(v) if v < points => Ok(v),
        _ => Err(Error::format(format!(
            "vertex index {} in {} is out of range for {} points",
            value, what, points
        ))),
    }
}

/// Decode every recorded cell section into the flat buffer `out`.
/// Returns the number of cells.
fn read_cell_sections<T: Component, R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    classes: &[(CellClass, u64)],
    file_type: FileType,
    order: Endianness,
    points: usize,
    out: &mut [T],
) -> Result<usize> {
    let mut writer = CellBufferWriter::new(out);
    let mut cell = CellPoints::new();

    for &(class, offset) in classes {
        let keyword = class.keyword();
        let line = stream.read_section(offset, keyword)?;
        let mut tokens = line.split_whitespace().skip(1);
        let n: usize = parse_field(tokens.next(), "cell count")?;
        let size: usize = parse_field(tokens.next(), "cell list size")?;

        match file_type {
            FileType::Ascii => {
                for _ in 0..n {
                    let k: usize = stream.parse_next(keyword)?;
                    cell.clear();
                    for _ in 0..k {
                        cell.push(check_index(stream.parse_next(keyword)?, points, keyword)?);
                    }
                    writer.push_cell(class.cell_type(), &cell)?;
                }
            }
            FileType::Binary => {
                let mut raw = vec![0i32; size];
                stream.read_range(&mut raw, order, keyword)?;
                stream.skip_line_break()?;
                let mut pos = 0;
                for _ in 0..n {
                    let k = *raw.get(pos).ok_or_else(|| Error::unexpected_end(keyword))?;
                    let k = usize::try_from(k).map_err(|_| {
                        Error::format(format!("negative vertex count {} in {}", k, keyword))
                    })?;
                    let ids = raw
                        .get(pos + 1..pos + 1 + k)
                        .ok_or_else(|| Error::unexpected_end(keyword))?;
                    cell.clear();
                    for &id in ids {
                        cell.push(check_index(i64::from(id), points, keyword)?);
                    }
                    writer.push_cell(class.cell_type(), &cell)?;
                    pos += 1 + k;
                }
            }
        }
    }
    writer.finish()
}

fn read_attribute_payload<T: Component, R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    header: &AttributeHeader,
    attr: &AttributeInfo,
    file_type: FileType,
    order: Endianness,
    out: &mut [T],
) -> Result<()> {
    let what = header.kind.keyword();
    if header.kind == AttributeKind::Tensors {
        let components = tensor_components(attr.components)?;
        let mut full = vec![T::default(); attr.count * 9];
        read_payload(stream, file_type, header.component_type, order, &mut full, what)?;
        return compress_tensors(&full, components, out);
    }
    if attr.components != header.components {
        return Err(Error::TypeMismatch {
            expected: format!("{} components per tuple", header.components),
            actual: format!("{} components per tuple", attr.components),
        });
    }
    read_payload(stream, file_type, header.component_type, order, out, what)
}

// === Writing ===

fn type_name<T: Component>() -> Result<&'static str> {
    T::COMPONENT_TYPE
        .vtk_name()
        .ok_or_else(|| Error::unsupported(format!("{} values in a VTK file", T::COMPONENT_TYPE)))
}

fn write_payload<T: Component>(
    out: &mut OStream,
    data: &[T],
    per_line: usize,
    file_type: FileType,
    order: Endianness,
) -> Result<()> {
    match file_type {
        FileType::Ascii => out.write_text_values(data, per_line),
        FileType::Binary => {
            out.write_range(data, order)?;
            out.write_bytes(b"\n")
        }
    }
}

fn pad_to_3<T: Component>(data: &[T], components: usize) -> Result<Cow<'_, [T]>> {
    pad_tuples(data, components, 3).ok_or_else(|| {
        Error::unsupported(format!("{}-component tuples in a VTK file", components))
    })
}

fn write_point_payload<T: Component>(
    out: &mut OStream,
    data: &[T],
    points: usize,
    dimension: usize,
    file_type: FileType,
    order: Endianness,
) -> Result<()> {
    out.write_line(format_args!("POINTS {} {}", points, type_name::<T>()?))?;
    let padded = pad_to_3(data, dimension)?;
    write_payload(out, &padded, 3, file_type, order)
}

fn write_cell_section(
    out: &mut OStream,
    class: CellClass,
    cells: usize,
    stream: &[usize],
    file_type: FileType,
    order: Endianness,
) -> Result<()> {
    out.write_line(format_args!("{} {} {}", class.keyword(), cells, stream.len()))?;
    match file_type {
        FileType::Ascii => {
            let mut pos = 0;
            while pos < stream.len() {
                let end = pos + 1 + stream[pos];
                out.write_text_values(&stream[pos..end], end - pos)?;
                pos = end;
            }
        }
        FileType::Binary => {
            for &v in stream {
                let v = i32::try_from(v).map_err(|_| {
                    Error::format(format!("{} value {} does not fit in int", class.keyword(), v))
                })?;
                out.write_i32(v, order)?;
            }
            out.write_bytes(b"\n")?;
        }
    }
    Ok(())
}

/// Write the flat buffer as class sections and return the emitted totals.
fn write_cell_sections<T: Component>(
    out: &mut OStream,
    data: &[T],
    file_type: FileType,
    order: Endianness,
) -> Result<CellClassCounts> {
    let mut counts = CellClassCounts::tally(data)?;

    let (chains, line_indices) = chain_cells(&class_cells(data, CellClass::Line)?);
    if chains.len() != counts.lines {
        tracing::debug!(segments = counts.lines, polylines = chains.len(), "chained line cells");
    }
    counts.lines = chains.len();
    counts.line_indices = line_indices;
    let mut lines = Vec::with_capacity(line_indices);
    for chain in &chains {
        lines.push(chain.len());
        lines.extend_from_slice(chain);
    }

    let sections = [
        (CellClass::Vertex, encode_class(data, CellClass::Vertex)?),
        (CellClass::Line, lines),
        (CellClass::Polygon, encode_class(data, CellClass::Polygon)?),
    ];
    for (class, stream) in &sections {
        let (cells, _) = counts.class(*class);
        if cells > 0 {
            write_cell_section(out, *class, cells, stream, file_type, order)?;
        }
    }
    Ok(counts)
}

/// Color component as `f64`. NaN, infinities and values beyond the `f32`
/// range cannot be stored.
fn color_value<T: Component>(v: &T) -> Result<f64> {
    v.to_f64()
        .filter(|x| x.is_finite() && x.abs() <= f64::from(f32::MAX))
        .ok_or_else(|| Error::format(format!("COLOR_SCALARS value {} is out of range", v)))
}

fn write_attribute_payload<T: Component>(
    out: &mut OStream,
    kind: AttributeKind,
    name: &str,
    attr: &AttributeInfo,
    file_type: FileType,
    order: Endianness,
    data: &[T],
) -> Result<()> {
    match kind {
        AttributeKind::Scalars => {
            if attr.components > 1 {
                out.write_line(format_args!(
                    "SCALARS {} {} {}",
                    name,
                    type_name::<T>()?,
                    attr.components
                ))?;
            } else {
                out.write_line(format_args!("SCALARS {} {}", name, type_name::<T>()?))?;
            }
            out.write_line(format_args!("LOOKUP_TABLE default"))?;
            write_payload(out, data, attr.components, file_type, order)
        }
        AttributeKind::Vectors | AttributeKind::Normals => {
            out.write_line(format_args!("{} {} {}", kind.keyword(), name, type_name::<T>()?))?;
            let padded = pad_to_3(data, attr.components)?;
            write_payload(out, &padded, 3, file_type, order)
        }
        AttributeKind::Tensors => {
            let full = expand_tensors(data, attr.components)?;
            out.write_line(format_args!("TENSORS {} {}", name, type_name::<T>()?))?;
            write_payload(out, &full, 3, file_type, order)
        }
        AttributeKind::ColorScalars => {
            out.write_line(format_args!("COLOR_SCALARS {} {}", name, attr.components))?;
            match file_type {
                FileType::Ascii => {
                    let values = data
                        .iter()
                        .map(|v| color_value(v).map(|x| x as f32))
                        .collect::<Result<Vec<f32>>>()?;
                    out.write_text_values(&values, attr.components)
                }
                FileType::Binary => {
                    let bytes = data
                        .iter()
                        .map(|v| color_value(v).map(|x| x.clamp(0.0, 255.0) as u8))
                        .collect::<Result<Vec<u8>>>()?;
                    out.write_bytes(&bytes)?;
                    out.write_bytes(b"\n")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_file(text: &[u8]) -> NamedTempFile {
        let tmp = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();
        std::fs::write(tmp.path(), text).unwrap();
        tmp
    }

    #[test]
    fn test_can_read_write() {
        let io = VtkPolyDataMeshIO::new();
        let tmp = write_file(b"");
        assert!(io.can_read(tmp.path()));
        assert!(io.can_write(Path::new("out/mesh.VTK")));
        assert!(!io.can_write(Path::new("mesh.byu")));
        assert!(!io.can_read(Path::new("/definitely/missing/mesh.vtk")));
    }

    #[test]
    fn test_probe_missing_file() {
        let mut io = VtkPolyDataMeshIO::new();
        io.set_file_name(Path::new("/definitely/missing/mesh.vtk"));
        assert!(matches!(io.read_mesh_information(), Err(Error::FileNotFound(_))));
        assert_eq!(io.state(), IoState::Unopened);
    }

    #[test]
    fn test_read_before_probe() {
        let mut io = VtkPolyDataMeshIO::new();
        let mut buf = MeshBuffer::from(Vec::<f32>::new());
        assert!(matches!(io.read_points(&mut buf), Err(Error::InvalidState { .. })));
    }

    #[test]
    fn test_cells_in_reverse_section_order() -> Result<()> {
        let tmp = write_file(
            b"# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n\
              POINTS 3 float\n0 0 0 1 0 0 0 1 0\n\
              POLYGONS 1 4\n3 0 1 2\n\
              VERTICES 1 2\n1 2\n",
        );
        let mut io = VtkPolyDataMeshIO::new();
        io.set_file_name(tmp.path());
        io.read_mesh_information()?;
        let mut cells = MeshBuffer::zeroed(ComponentType::Uint32, io.info().cell_buffer_size)?;
        io.read_cells(&mut cells)?;
        assert_eq!(cells.as_slice::<u32>().unwrap(), &[4, 3, 0, 1, 2, 0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_index_out_of_range() -> Result<()> {
        let tmp = write_file(
            b"# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n\
              POINTS 2 float\n0 0 0 1 0 0\n\
              LINES 1 3\n2 0 5\n",
        );
        let mut io = VtkPolyDataMeshIO::new();
        io.set_file_name(tmp.path());
        io.read_mesh_information()?;
        let mut cells = MeshBuffer::zeroed(ComponentType::Uint32, io.info().cell_buffer_size)?;
        assert!(matches!(io.read_cells(&mut cells), Err(Error::Format(_))));
        Ok(())
    }

    #[test]
    fn test_wide_tuples_rejected() {
        assert!(matches!(pad_to_3(&[1.0f32; 4], 4), Err(Error::UnsupportedType(_))));
    }
}
