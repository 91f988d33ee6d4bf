//! Output stream for mesh writers.

use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::util::{write_range, Component, Endianness, Result};

/// Buffered file writer.
///
/// A header write creates the file; every later section reopens it in
/// append mode, so each write call is self-contained and flushed.
pub struct OStream {
    writer: BufWriter<File>,
}

impl OStream {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { writer: BufWriter::with_capacity(256 * 1024, file) })
    }

    /// Open an existing file for appending.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { writer: BufWriter::with_capacity(256 * 1024, file) })
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    /// Write formatted text followed by a line break.
    pub fn write_line(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        let mut line = args.to_string();
        line.push('\n');
        self.write_bytes(line.as_bytes())
    }

    /// Write values as text, `per_line` values per line.
    pub fn write_text_values<T: Display>(&mut self, values: &[T], per_line: usize) -> Result<()> {
        let per_line = per_line.max(1);
        let mut line = String::new();
        for row in values.chunks(per_line) {
            line.clear();
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push_str(&v.to_string());
            }
            line.push('\n');
            self.write_bytes(line.as_bytes())?;
        }
        Ok(())
    }

    /// Write an i32 value in `order`.
    pub fn write_i32(&mut self, value: i32, order: Endianness) -> Result<()> {
        match order {
            Endianness::Big => self.writer.write_i32::<BigEndian>(value)?,
            Endianness::Little => self.writer.write_i32::<LittleEndian>(value)?,
        }
        Ok(())
    }

    /// Write a run of values in `order`.
    pub fn write_range<T: Component>(&mut self, data: &[T], order: Endianness) -> Result<()> {
        write_range(&mut self.writer, data, order)?;
        Ok(())
    }

    /// Flush the buffer to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
