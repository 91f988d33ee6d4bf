//! Utility types and functions for mesh codecs.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ComponentType`] / [`Component`] - Numeric component registry
//! - [`PixelType`] - Attribute tuple shapes
//! - [`MeshBuffer`] - Typed caller buffers and the dispatch table
//! - [`Endianness`] - Wire byte order normalization
//! - [`Error`] / [`Result`] - Error handling

mod pod;
mod pixel;
mod buffer;
mod byte_order;
mod error;

pub use pod::*;
pub use pixel::*;
pub use buffer::{pad_tuples, MeshBuffer};
pub(crate) use buffer::with_buffer;
pub use byte_order::*;
pub use error::*;
