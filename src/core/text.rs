//! Line and token scanner over a raw byte stream.
//!
//! Mesh files are always opened as raw bytes, even the text formats: section
//! offsets recorded by a probe must stay valid for seeking, and binary
//! payloads sit between text header lines. [`TextStream`] tracks the byte
//! position itself and offers both text (lines, tokens) and binary (exact
//! byte runs) reads on the same cursor.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::util::{read_range, Component, Endianness, Error, Result};

/// Positioned reader that mixes text and binary reads.
pub struct TextStream<R> {
    inner: R,
    pos: u64,
}

impl TextStream<BufReader<File>> {
    /// Open a file as raw bytes.
    ///
    /// A missing file is reported as [`Error::FileNotFound`].
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Ok(Self { inner: BufReader::new(file), pos: 0 })
    }
}

impl<R: BufRead + Seek> TextStream<R> {
    /// Wrap a reader, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    /// Current byte offset.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move the cursor to an absolute byte offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Read one line without its terminator. `None` at end of stream.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self.inner.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n as u64;
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Seek to a recorded section header and return its line.
    ///
    /// The first token must be `keyword`, compared ignoring ASCII case.
    pub fn read_section(&mut self, offset: u64, keyword: &str) -> Result<String> {
        self.seek_to(offset)?;
        let line = self.read_line()?.ok_or_else(|| Error::unexpected_end(keyword))?;
        match line.split_whitespace().next() {
            Some(first) if first.eq_ignore_ascii_case(keyword) => Ok(line),
            _ => Err(Error::format(format!(
                "expected {} section at byte {}, found '{}'",
                keyword, offset, line
            ))),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    fn consume(&mut self, n: usize) {
        self.inner.consume(n);
        self.pos += n as u64;
    }

    /// Next whitespace-delimited token, crossing line breaks.
    pub fn next_token(&mut self) -> Result<Option<String>> {
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.consume(1);
        }
        let mut token = Vec::new();
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                break;
            }
            let end = available
                .iter()
                .position(|b| b.is_ascii_whitespace())
                .unwrap_or(available.len());
            token.extend_from_slice(&available[..end]);
            let done = end < available.len();
            self.consume(end);
            if done {
                break;
            }
        }
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&token).into_owned()))
        }
    }

    /// Parse the next token as `T`.
    pub fn parse_next<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.next_token()?.ok_or_else(|| Error::unexpected_end(what))?;
        token
            .parse()
            .map_err(|_| Error::format(format!("invalid value '{}' in {}", token, what)))
    }

    /// Fill `out` with text values.
    pub fn read_values<T: Component>(&mut self, out: &mut [T], what: &str) -> Result<()> {
        for slot in out.iter_mut() {
            let token = self.next_token()?.ok_or_else(|| Error::unexpected_end(what))?;
            *slot = T::parse_token(&token).ok_or_else(|| {
                Error::format(format!(
                    "invalid {} value '{}' in {}",
                    T::COMPONENT_TYPE,
                    token,
                    what
                ))
            })?;
        }
        Ok(())
    }

    /// Skip `n` tokens.
    pub fn skip_tokens(&mut self, n: usize, what: &str) -> Result<()> {
        for _ in 0..n {
            self.next_token()?.ok_or_else(|| Error::unexpected_end(what))?;
        }
        Ok(())
    }

    /// Skip `n` raw bytes, failing if the stream is shorter.
    pub fn skip_bytes(&mut self, n: u64, what: &str) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        self.pos += skipped;
        if skipped < n {
            return Err(Error::unexpected_end(what));
        }
        Ok(())
    }

    /// Fill `out` with binary values stored in `order`.
    pub fn read_range<T: Component>(
        &mut self,
        out: &mut [T],
        order: Endianness,
        what: &str,
    ) -> Result<()> {
        read_range(&mut self.inner, out, order).map_err(|e| eof_as_format(e, what))?;
        self.pos += (out.len() * T::SIZE) as u64;
        Ok(())
    }

    /// Consume one line break (`\n` or `\r\n`) if the cursor is on one.
    pub fn skip_line_break(&mut self) -> Result<()> {
        if self.peek_byte()? == Some(b'\r') {
            self.consume(1);
        }
        if self.peek_byte()? == Some(b'\n') {
            self.consume(1);
        }
        Ok(())
    }
}

fn eof_as_format(e: io::Error, what: &str) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::unexpected_end(what)
    } else {
        Error::Io(e)
    }
}
