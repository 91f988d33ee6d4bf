//! Metadata side store for mesh codecs.
//!
//! The flat cell buffer and the attribute buffers do not carry everything a
//! format needs (topology class totals, attribute names, the file title).
//! That information travels next to the buffers as string key-value pairs,
//! read and written through typed accessors.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use super::AttributeLocation;

/// Metadata storage - key-value pairs of strings.
///
/// Uses SmallVec optimization for common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct MetaData {
    entries: SmallVec<[(String, String); 8]>,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        // Update existing or add new
        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a metadata value parsed as `T`.
    ///
    /// Returns `None` if the key is absent or the value does not parse.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Store any displayable value.
    pub fn set_value<T: fmt::Display>(&mut self, key: impl Into<String>, value: T) {
        self.set(key, value.to_string());
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        if let Some(pos) = self.entries.iter().position(|(k, _)| k == key) {
            Some(self.entries.remove(pos).1)
        } else {
            None
        }
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // === Common metadata keys ===

    /// Free-form file title key.
    pub const TITLE_KEY: &'static str = "title";

    /// Number of vertex-class cells.
    pub const VERTICES_KEY: &'static str = "cells.vertices";
    /// Number of on-disk integers in the vertex section.
    pub const VERTEX_INDICES_KEY: &'static str = "cells.vertex_indices";
    /// Number of line-class cells (polylines).
    pub const LINES_KEY: &'static str = "cells.lines";
    /// Number of on-disk integers in the line section.
    pub const LINE_INDICES_KEY: &'static str = "cells.line_indices";
    /// Number of polygon-class cells.
    pub const POLYGONS_KEY: &'static str = "cells.polygons";
    /// Number of on-disk integers in the polygon section.
    pub const POLYGON_INDICES_KEY: &'static str = "cells.polygon_indices";

    /// Get the file title.
    pub fn title(&self) -> Option<&str> {
        self.get(Self::TITLE_KEY)
    }

    /// Set the file title.
    pub fn set_title(&mut self, title: &str) {
        self.set(Self::TITLE_KEY, title);
    }

    /// Key under which the name of an attribute block is stored, e.g.
    /// `point.scalars.name`.
    pub fn data_name_key(location: AttributeLocation, label: &str) -> String {
        format!("{}.{}.name", location.name(), label)
    }

    /// Get the name of the attribute block of kind `label` at `location`.
    pub fn data_name(&self, location: AttributeLocation, label: &str) -> Option<&str> {
        self.get(&Self::data_name_key(location, label))
    }

    /// Set the name of the attribute block of kind `label` at `location`.
    pub fn set_data_name(&mut self, location: AttributeLocation, label: &str, name: &str) {
        self.set(Self::data_name_key(location, label), name);
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
