//! Probe pass over a VTK legacy POLYDATA file.
//!
//! The walk reads every section header, skips its payload (tokens in ASCII
//! files, bytes in BINARY files) and records where each section starts, so
//! that the materialize calls can seek straight to their section no matter
//! in which order the file lists them.

use smallvec::SmallVec;
use std::io::{BufRead, Seek};
use std::str::FromStr;

use super::attribute::{is_lookup_table, AttributeHeader, AttributeKind};
use crate::core::{
    AttributeInfo, AttributeLocation, CellClass, CellClassCounts, FileType, MeshInfo, MetaData,
    TextStream,
};
use crate::util::{ComponentType, Error, Result};

/// First line of every VTK legacy file.
pub const MAGIC: &str = "# vtk DataFile Version";
/// Version written by this crate.
pub const VERSION: &str = "3.0";

/// The recorded attribute block of one location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSection {
    /// Offset of the attribute header line
    pub offset: u64,
    pub header: AttributeHeader,
}

/// Section offsets found by the probe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    pub points: Option<u64>,
    /// Component type of the points on disk
    pub point_type: ComponentType,
    /// Cell sections in file order
    pub classes: SmallVec<[(CellClass, u64); 3]>,
    pub point_data: Option<AttributeSection>,
    pub cell_data: Option<AttributeSection>,
}

impl Layout {
    pub fn attribute(&self, location: AttributeLocation) -> Option<&AttributeSection> {
        match location {
            AttributeLocation::Point => self.point_data.as_ref(),
            AttributeLocation::Cell => self.cell_data.as_ref(),
        }
    }

    fn attribute_mut(&mut self, location: AttributeLocation) -> &mut Option<AttributeSection> {
        match location {
            AttributeLocation::Point => &mut self.point_data,
            AttributeLocation::Cell => &mut self.cell_data,
        }
    }
}

/// Parse one numeric header field.
pub fn parse_field<T: FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| Error::format(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| Error::format(format!("invalid {} '{}'", what, token)))
}

/// `count * width`, with overflow reported as a format error.
pub fn payload_len(count: usize, width: usize, what: &str) -> Result<usize> {
    count
        .checked_mul(width)
        .ok_or_else(|| Error::format(format!("{} count {} is too large", what, count)))
}

/// Skip `values` payload values of `bytes` bytes each.
pub fn skip_payload<R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    file_type: FileType,
    values: usize,
    bytes: usize,
    what: &str,
) -> Result<()> {
    match file_type {
        FileType::Ascii => stream.skip_tokens(values, what),
        FileType::Binary => {
            let len = payload_len(values, bytes, what)?;
            stream.skip_bytes(len as u64, what)?;
            stream.skip_line_break()
        }
    }
}

/// Read the four header lines and return the encoding.
fn read_preamble<R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    meta: &mut MetaData,
) -> Result<FileType> {
    let magic = stream.read_line()?.ok_or_else(|| Error::format("empty file"))?;
    if !magic.trim_start().starts_with(MAGIC) {
        return Err(Error::format(format!("not a VTK legacy file, first line is '{}'", magic)));
    }

    let title = stream.read_line()?.ok_or_else(|| Error::unexpected_end("header"))?;
    meta.set_title(title.trim());

    let encoding = stream.read_line()?.ok_or_else(|| Error::unexpected_end("header"))?;
    let file_type = match encoding.trim().to_ascii_uppercase().as_str() {
        "ASCII" => FileType::Ascii,
        "BINARY" => FileType::Binary,
        other => return Err(Error::format(format!("unknown encoding '{}'", other))),
    };

    loop {
        let line = stream.read_line()?.ok_or_else(|| Error::unexpected_end("DATASET"))?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None => continue,
            Some(t) if t.eq_ignore_ascii_case("DATASET") => {
                let dataset = tokens.next().unwrap_or("");
                if !dataset.eq_ignore_ascii_case("POLYDATA") {
                    return Err(Error::format(format!(
                        "dataset '{}' is not POLYDATA",
                        dataset
                    )));
                }
                return Ok(file_type);
            }
            Some(t) => {
                return Err(Error::format(format!("expected DATASET line, found '{}'", t)));
            }
        }
    }
}

/// Walk the whole file, filling `info` and `meta`.
pub fn probe<R: BufRead + Seek>(
    stream: &mut TextStream<R>,
    info: &mut MeshInfo,
    meta: &mut MetaData,
) -> Result<Layout> {
    let file_type = read_preamble(stream, meta)?;
    let mut layout = Layout::default();
    let mut counts = CellClassCounts::default();
    let mut block: Option<(AttributeLocation, usize)> = None;

    loop {
        let offset = stream.position();
        let Some(line) = stream.read_line()? else {
            break;
        };
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let keyword = keyword.to_ascii_uppercase();

        match keyword.as_str() {
            "POINTS" => {
                let n: usize = parse_field(tokens.next(), "POINTS count")?;
                let type_name = tokens.next().unwrap_or("");
                let ty = ComponentType::from_vtk_name(type_name);
                if ty == ComponentType::Unknown {
                    return Err(Error::unsupported(format!("POINTS data type '{}'", type_name)));
                }
                info.number_of_points = n;
                info.point_dimension = 3;
                info.point_component_type = ty;
                layout.points = Some(offset);
                layout.point_type = ty;
                tracing::debug!(points = n, component = %ty, offset, "found POINTS");
                let values = payload_len(n, 3, "POINTS")?;
                skip_payload(stream, file_type, values, ty.num_bytes(), "POINTS")?;
            }
            "VERTICES" | "LINES" | "POLYGONS" | "TRIANGLE_STRIPS" => {
                let n: usize = parse_field(tokens.next(), "cell count")?;
                let size: usize = parse_field(tokens.next(), "cell list size")?;
                match CellClass::from_keyword(&keyword) {
                    Some(class) => {
                        counts.add_section(class, n, size);
                        layout.classes.push((class, offset));
                        tracing::debug!(section = %keyword, cells = n, size, offset, "found cells");
                    }
                    None => {
                        tracing::warn!(cells = n, "skipping unsupported TRIANGLE_STRIPS section");
                    }
                }
                skip_payload(stream, file_type, size, 4, &keyword)?;
            }
            "POINT_DATA" | "CELL_DATA" => {
                let location = if keyword == "POINT_DATA" {
                    AttributeLocation::Point
                } else {
                    AttributeLocation::Cell
                };
                let n: usize = parse_field(tokens.next(), "attribute count")?;
                block = Some((location, n));
            }
            "LOOKUP_TABLE" => {
                // standalone color table: size RGBA entries
                let _name = tokens.next();
                let size: usize = parse_field(tokens.next(), "LOOKUP_TABLE size")?;
                let bytes = payload_len(size, 4, "LOOKUP_TABLE")?;
                skip_payload(stream, file_type, bytes, 1, "LOOKUP_TABLE")?;
            }
            "FIELD" | "METADATA" => {
                tracing::warn!(section = %keyword, "unsupported section, ignoring the rest of the file");
                break;
            }
            _ => {
                let header = AttributeHeader::parse(&line, file_type)?.ok_or_else(|| {
                    Error::format(format!("unknown section keyword '{}'", keyword))
                })?;
                let (location, count) = block.ok_or_else(|| {
                    Error::format(format!(
                        "{} outside of a POINT_DATA or CELL_DATA block",
                        header.kind.keyword()
                    ))
                })?;

                if header.kind == AttributeKind::Scalars {
                    let mark = stream.position();
                    match stream.read_line()? {
                        Some(l) if is_lookup_table(&l) => {}
                        _ => {
                            tracing::debug!(name = %header.name, "SCALARS without LOOKUP_TABLE line");
                            stream.seek_to(mark)?;
                        }
                    }
                }

                let values = payload_len(count, header.stored_components(), header.kind.keyword())?;
                skip_payload(
                    stream,
                    file_type,
                    values,
                    header.component_type.num_bytes(),
                    header.kind.keyword(),
                )?;

                let slot = layout.attribute_mut(location);
                if slot.is_some() {
                    tracing::debug!(
                        kind = header.kind.label(),
                        name = %header.name,
                        "skipping additional {} attribute",
                        location.name()
                    );
                    continue;
                }
                tracing::debug!(
                    location = location.name(),
                    kind = header.kind.label(),
                    name = %header.name,
                    count,
                    "found attribute"
                );
                meta.set_data_name(location, header.kind.label(), &header.name);
                *info.attribute_mut(location) = AttributeInfo {
                    pixel_type: header.kind.pixel_type(),
                    component_type: header.component_type,
                    components: header.components,
                    count,
                };
                *slot = Some(AttributeSection { offset, header });
            }
        }
    }

    if layout.points.is_none() {
        return Err(Error::format("missing POINTS section"));
    }

    info.file_type = file_type;
    info.number_of_cells = counts.number_of_cells();
    info.cell_buffer_size = counts.cell_buffer_size();
    counts.store(meta);
    Ok(layout)
}

/// Header lines of a file written with `file_type`.
pub fn preamble(title: &str, file_type: FileType) -> String {
    format!("{} {}\n{}\n{}\nDATASET POLYDATA\n", MAGIC, VERSION, title, file_type)
}
