//! Flat cell buffer encoding.
//!
//! Every cell of a mesh, whatever its topology, lives in one flat buffer of
//! numeric components:
//!
//! ```text
//! [type_code, n, v0, v1, .. v{n-1}]  [type_code, n, ...]  ...
//! ```
//!
//! The buffer length is therefore the sum of `2 + n` over all cells. Vertex
//! indices are zero-based. Formats that group cells by topology class
//! (vertices, lines, polygons) use [`CellClassCounts`] and [`encode_class`]
//! to split the flat buffer back into per-class sections.

use smallvec::SmallVec;
use std::fmt;

use super::MetaData;
use crate::util::{Component, Error, Result};

/// Vertex indices of one cell.
pub type CellPoints = SmallVec<[usize; 8]>;

/// Topology of a single cell, with its numeric code in the flat buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Vertex = 0,
    Line = 1,
    Triangle = 2,
    Quadrilateral = 3,
    Polygon = 4,
    Tetrahedron = 5,
    Hexahedron = 6,
    QuadraticEdge = 7,
    QuadraticTriangle = 8,
}

impl CellType {
    /// Look up a cell type by its buffer code.
    pub const fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Self::Vertex,
            1 => Self::Line,
            2 => Self::Triangle,
            3 => Self::Quadrilateral,
            4 => Self::Polygon,
            5 => Self::Tetrahedron,
            6 => Self::Hexahedron,
            7 => Self::QuadraticEdge,
            8 => Self::QuadraticTriangle,
            _ => return None,
        })
    }

    /// Numeric code stored in the flat buffer.
    #[inline]
    pub const fn code(self) -> usize {
        self as usize
    }

    /// Output class of this cell type, or `None` for cells that cannot be
    /// written to a class-sectioned format.
    pub const fn class(self) -> Option<CellClass> {
        match self {
            Self::Vertex => Some(CellClass::Vertex),
            Self::Line => Some(CellClass::Line),
            Self::Triangle | Self::Quadrilateral | Self::Polygon => Some(CellClass::Polygon),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Quadrilateral => "quadrilateral",
            Self::Polygon => "polygon",
            Self::Tetrahedron => "tetrahedron",
            Self::Hexahedron => "hexahedron",
            Self::QuadraticEdge => "quadratic_edge",
            Self::QuadraticTriangle => "quadratic_triangle",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three topology classes of sectioned formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    Vertex,
    Line,
    Polygon,
}

impl CellClass {
    /// All classes in on-disk order.
    pub const ALL: [CellClass; 3] = [Self::Vertex, Self::Line, Self::Polygon];

    /// Cell type assigned to every cell decoded from this class's section.
    pub const fn cell_type(self) -> CellType {
        match self {
            Self::Vertex => CellType::Vertex,
            Self::Line => CellType::Line,
            Self::Polygon => CellType::Polygon,
        }
    }

    /// Section keyword of this class in VTK legacy files.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Vertex => "VERTICES",
            Self::Line => "LINES",
            Self::Polygon => "POLYGONS",
        }
    }

    /// Look up a class by its section keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == keyword)
    }

    const fn keys(self) -> (&'static str, &'static str) {
        match self {
            Self::Vertex => (MetaData::VERTICES_KEY, MetaData::VERTEX_INDICES_KEY),
            Self::Line => (MetaData::LINES_KEY, MetaData::LINE_INDICES_KEY),
            Self::Polygon => (MetaData::POLYGONS_KEY, MetaData::POLYGON_INDICES_KEY),
        }
    }
}

/// One decoded cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub cell_type: CellType,
    pub points: CellPoints,
}

impl Cell {
    pub fn new(cell_type: CellType, points: &[usize]) -> Self {
        Self { cell_type, points: CellPoints::from_slice(points) }
    }
}

// === Iteration ===

fn to_index<T: Component>(value: T, what: &str) -> Result<usize> {
    value
        .to_usize()
        .ok_or_else(|| Error::format(format!("invalid {} {} in cell buffer", what, value)))
}

/// Iterator over the cells of a flat buffer.
///
/// Yields an error (and then stops) on a truncated buffer, an unknown type
/// code or a negative index.
pub struct Cells<'a, T> {
    data: &'a [T],
    pos: usize,
    failed: bool,
}

impl<'a, T: Component> Cells<'a, T> {
    fn next_cell(&mut self) -> Result<Cell> {
        let rest = &self.data[self.pos..];
        if rest.len() < 2 {
            return Err(Error::format("cell buffer truncated inside a cell header"));
        }
        let code = to_index(rest[0], "cell type")?;
        let cell_type = CellType::from_code(code as u64)
            .ok_or_else(|| Error::unsupported(format!("cell type code {}", code)))?;
        let n = to_index(rest[1], "vertex count")?;
        if n > rest.len() - 2 {
            return Err(Error::format(format!(
                "cell buffer truncated: {} cell declares {} vertices, {} values left",
                cell_type,
                n,
                rest.len() - 2
            )));
        }
        let points = rest[2..2 + n]
            .iter()
            .map(|&v| to_index(v, "vertex index"))
            .collect::<Result<CellPoints>>()?;
        self.pos += 2 + n;
        Ok(Cell { cell_type, points })
    }
}

impl<T: Component> Iterator for Cells<'_, T> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let cell = self.next_cell();
        self.failed = cell.is_err();
        Some(cell)
    }
}

/// Iterate over the cells of a flat buffer.
pub fn cells<T: Component>(data: &[T]) -> Cells<'_, T> {
    Cells { data, pos: 0, failed: false }
}

// === Class tallies ===

/// Per-class cell and index totals.
///
/// `*_indices` count the integers a sectioned format stores for the class,
/// i.e. the sum of `n + 1` over its cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellClassCounts {
    pub vertices: usize,
    pub vertex_indices: usize,
    pub lines: usize,
    pub line_indices: usize,
    pub polygons: usize,
    pub polygon_indices: usize,
}

impl CellClassCounts {
    /// Count the cells of a flat buffer per class.
    ///
    /// Fails with `UnsupportedType` on cells outside the three classes.
    pub fn tally<T: Component>(data: &[T]) -> Result<Self> {
        let mut counts = Self::default();
        for cell in cells(data) {
            let cell = cell?;
            let class = cell.cell_type.class().ok_or_else(|| {
                Error::unsupported(format!("{} cells have no section class", cell.cell_type))
            })?;
            counts.add(class, cell.points.len());
        }
        Ok(counts)
    }

    /// Account for one cell of `n` vertices in `class`.
    pub fn add(&mut self, class: CellClass, n: usize) {
        self.add_section(class, 1, n + 1);
    }

    /// Account for a whole section of `cells` cells holding `indices` integers.
    pub fn add_section(&mut self, class: CellClass, cells: usize, indices: usize) {
        let (c, i) = self.class_mut(class);
        *c += cells;
        *i += indices;
    }

    /// `(cells, indices)` of one class.
    pub fn class(&self, class: CellClass) -> (usize, usize) {
        match class {
            CellClass::Vertex => (self.vertices, self.vertex_indices),
            CellClass::Line => (self.lines, self.line_indices),
            CellClass::Polygon => (self.polygons, self.polygon_indices),
        }
    }

    fn class_mut(&mut self, class: CellClass) -> (&mut usize, &mut usize) {
        match class {
            CellClass::Vertex => (&mut self.vertices, &mut self.vertex_indices),
            CellClass::Line => (&mut self.lines, &mut self.line_indices),
            CellClass::Polygon => (&mut self.polygons, &mut self.polygon_indices),
        }
    }

    /// Total number of cells.
    pub fn number_of_cells(&self) -> usize {
        self.vertices + self.lines + self.polygons
    }

    /// Length of the flat buffer holding these cells.
    pub fn cell_buffer_size(&self) -> usize {
        self.vertex_indices + self.line_indices + self.polygon_indices + self.number_of_cells()
    }

    /// Read the totals stored by [`store`](Self::store). Missing keys read as zero.
    pub fn from_metadata(meta: &MetaData) -> Self {
        let mut counts = Self::default();
        for class in CellClass::ALL {
            let (cells_key, indices_key) = class.keys();
            let cells = meta.get_parsed(cells_key).unwrap_or(0);
            let indices = meta.get_parsed(indices_key).unwrap_or(0);
            counts.add_section(class, cells, indices);
        }
        counts
    }

    /// Record the totals in the metadata side store.
    pub fn store(&self, meta: &mut MetaData) {
        for class in CellClass::ALL {
            let (cells_key, indices_key) = class.keys();
            let (cells, indices) = self.class(class);
            meta.set_value(cells_key, cells);
            meta.set_value(indices_key, indices);
        }
    }
}

/// Collect the cells of one class from a flat buffer, in buffer order.
pub fn class_cells<T: Component>(data: &[T], class: CellClass) -> Result<Vec<CellPoints>> {
    let mut out = Vec::new();
    for cell in cells(data) {
        let cell = cell?;
        match cell.cell_type.class() {
            Some(c) if c == class => out.push(cell.points),
            Some(_) => {}
            None => {
                return Err(Error::unsupported(format!(
                    "{} cells have no section class",
                    cell.cell_type
                )))
            }
        }
    }
    Ok(out)
}

/// Dense `[n, v0 .. v{n-1}]*` stream of the cells of one class.
pub fn encode_class<T: Component>(data: &[T], class: CellClass) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for points in class_cells(data, class)? {
        out.push(points.len());
        out.extend_from_slice(&points);
    }
    Ok(out)
}

// === Writing into caller buffers ===

/// Bounds-checked writer of a flat cell buffer into caller storage.
///
/// Cells are either pushed whole ([`push_cell`](Self::push_cell)) or built
/// index by index for marker-terminated input, in which case the header is
/// filled in when the cell is closed.
pub struct CellBufferWriter<'a, T> {
    out: &'a mut [T],
    pos: usize,
    open: Option<usize>,
    cells: usize,
}

impl<'a, T: Component> CellBufferWriter<'a, T> {
    pub fn new(out: &'a mut [T]) -> Self {
        Self { out, pos: 0, open: None, cells: 0 }
    }

    /// Number of complete cells written.
    pub fn cells(&self) -> usize {
        self.cells
    }

    fn put(&mut self, value: usize) -> Result<()> {
        let len = self.out.len();
        let slot = self
            .out
            .get_mut(self.pos)
            .ok_or(Error::BufferSize { expected: self.pos + 1, actual: len })?;
        *slot = <T as num_traits::NumCast>::from(value).ok_or_else(|| {
            Error::format(format!("value {} does not fit in {}", value, T::COMPONENT_TYPE))
        })?;
        self.pos += 1;
        Ok(())
    }

    /// Append a complete cell.
    pub fn push_cell(&mut self, cell_type: CellType, points: &[usize]) -> Result<()> {
        if self.open.is_some() {
            return Err(Error::format("cannot push a cell while another is open"));
        }
        self.put(cell_type.code())?;
        self.put(points.len())?;
        for &p in points {
            self.put(p)?;
        }
        self.cells += 1;
        Ok(())
    }

    /// Open a cell whose length is not known yet.
    pub fn begin_cell(&mut self) -> Result<()> {
        if self.open.is_none() {
            self.open = Some(self.pos);
            // header slots, filled by end_cell
            self.put(0)?;
            self.put(0)?;
        }
        Ok(())
    }

    /// Append one vertex index to the open cell, opening one if needed.
    pub fn push_index(&mut self, index: usize) -> Result<()> {
        self.begin_cell()?;
        self.put(index)
    }

    /// Close the open cell and write its `[cell_type, n]` header.
    pub fn end_cell(&mut self, cell_type: CellType) -> Result<()> {
        let start = self
            .open
            .take()
            .ok_or_else(|| Error::format("no open cell to close"))?;
        let n = self.pos - start - 2;
        let header = |v: usize| {
            <T as num_traits::NumCast>::from(v).ok_or_else(|| {
                Error::format(format!("value {} does not fit in {}", v, T::COMPONENT_TYPE))
            })
        };
        self.out[start] = header(cell_type.code())?;
        self.out[start + 1] = header(n)?;
        self.cells += 1;
        Ok(())
    }

    /// Check that the caller buffer was filled exactly and return the
    /// number of cells written.
    pub fn finish(self) -> Result<usize> {
        if self.open.is_some() {
            return Err(Error::format("cell list ends inside an unterminated cell"));
        }
        if self.pos != self.out.len() {
            return Err(Error::BufferSize { expected: self.out.len(), actual: self.pos });
        }
        Ok(self.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Vec<u32> {
        vec![
            0, 1, 5, // vertex
            1, 2, 0, 1, // line
            2, 3, 0, 1, 2, // triangle
            3, 4, 0, 1, 2, 3, // quad
        ]
    }

    #[test]
    fn test_iterate_cells() {
        let data = mixed();
        let all: Vec<Cell> = cells(&data).collect::<Result<_>>().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], Cell::new(CellType::Vertex, &[5]));
        assert_eq!(all[2].cell_type, CellType::Triangle);
        assert_eq!(all[3].points.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_truncated_buffer() {
        let data = vec![2u32, 3, 0, 1];
        let mut it = cells(&data);
        assert!(matches!(it.next(), Some(Err(Error::Format(_)))));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_huge_vertex_count() {
        let data = vec![4u64, u64::MAX, 0, 1, 2];
        assert!(matches!(CellClassCounts::tally(&data), Err(Error::Format(_))));
        assert!(matches!(class_cells(&data, CellClass::Polygon), Err(Error::Format(_))));
    }

    #[test]
    fn test_unknown_code_and_negative_index() {
        let data = vec![42i32, 1, 0];
        assert!(matches!(cells(&data).next(), Some(Err(Error::UnsupportedType(_)))));

        let data = vec![1i32, 2, 0, -1];
        assert!(matches!(cells(&data).next(), Some(Err(Error::Format(_)))));
    }

    #[test]
    fn test_tally() {
        let counts = CellClassCounts::tally(&mixed()).unwrap();
        assert_eq!(counts.vertices, 1);
        assert_eq!(counts.vertex_indices, 2);
        assert_eq!(counts.lines, 1);
        assert_eq!(counts.line_indices, 3);
        assert_eq!(counts.polygons, 2);
        assert_eq!(counts.polygon_indices, 9);
        assert_eq!(counts.number_of_cells(), 4);
        assert_eq!(counts.cell_buffer_size(), mixed().len());
    }

    #[test]
    fn test_tally_unsupported() {
        let data = vec![5u32, 4, 0, 1, 2, 3];
        assert!(matches!(CellClassCounts::tally(&data), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_counts_metadata() {
        let counts = CellClassCounts::tally(&mixed()).unwrap();
        let mut meta = MetaData::new();
        counts.store(&mut meta);
        assert_eq!(meta.get(MetaData::POLYGON_INDICES_KEY), Some("9"));
        assert_eq!(CellClassCounts::from_metadata(&meta), counts);
        assert_eq!(CellClassCounts::from_metadata(&MetaData::new()), CellClassCounts::default());
    }

    #[test]
    fn test_encode_class() {
        let data = mixed();
        assert_eq!(encode_class(&data, CellClass::Vertex).unwrap(), vec![1, 5]);
        assert_eq!(encode_class(&data, CellClass::Line).unwrap(), vec![2, 0, 1]);
        assert_eq!(
            encode_class(&data, CellClass::Polygon).unwrap(),
            vec![3, 0, 1, 2, 4, 0, 1, 2, 3]
        );
    }

    #[test]
    fn test_writer_whole_and_marker_cells() {
        let mut out = vec![0u32; 9];
        let mut w = CellBufferWriter::new(&mut out);
        w.push_cell(CellType::Line, &[0, 1]).unwrap();
        w.push_index(2).unwrap();
        w.push_index(3).unwrap();
        w.push_index(4).unwrap();
        w.end_cell(CellType::Polygon).unwrap();
        assert_eq!(w.finish().unwrap(), 2);
        assert_eq!(out, vec![1, 2, 0, 1, 4, 3, 2, 3, 4]);
    }

    #[test]
    fn test_writer_overflow_and_underfill() {
        let mut out = vec![0u32; 3];
        let mut w = CellBufferWriter::new(&mut out);
        let err = w.push_cell(CellType::Line, &[0, 1]).unwrap_err();
        assert!(matches!(err, Error::BufferSize { .. }));

        let mut out = vec![0u32; 5];
        let mut w = CellBufferWriter::new(&mut out);
        w.push_cell(CellType::Vertex, &[0]).unwrap();
        assert!(matches!(w.finish(), Err(Error::BufferSize { expected: 5, actual: 3 })));
    }

    #[test]
    fn test_writer_value_does_not_fit() {
        let mut out = vec![0u8; 3];
        let mut w = CellBufferWriter::new(&mut out);
        assert!(w.push_cell(CellType::Vertex, &[300]).is_err());
    }
}
