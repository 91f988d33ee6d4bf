//! Core layer - the codec contract and format-independent building blocks.
//!
//! This module provides:
//! - [`MeshIO`] - The probe/materialize codec contract
//! - [`Session`] / [`IoState`] - Lifecycle state machine
//! - [`MeshInfo`] - Probe results and writer settings
//! - [`MetaData`] - Key-value side store
//! - Flat cell buffer encoding and polyline reconstruction
//! - [`TextStream`] / [`OStream`] - Positioned input scanner and output stream

mod metadata;
mod info;
mod state;
mod traits;
mod cells;
mod polyline;
mod text;
mod stream;

pub use metadata::MetaData;
pub use info::{AttributeInfo, AttributeLocation, FileType, MeshInfo};
pub use state::{IoState, Session, Stage};
pub use traits::MeshIO;
pub use cells::{
    cells, class_cells, encode_class, Cell, CellBufferWriter, CellClass, CellClassCounts,
    CellPoints, CellType, Cells,
};
pub use polyline::{chain_cells, chain_polylines};
pub use text::TextStream;
pub use stream::OStream;
