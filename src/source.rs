//! The byte source: a buffered, pushback-capable reader over a file or
//! stream.
//!
//! The whole input is read into memory once at construction — this keeps
//! "pushback" trivial (rewind a cursor) and the memory bound is still
//! O(N) transient bytes. Staging to a temporary file is only required
//! for the mbox splitter feeding a non-seekable stream; once staged,
//! the bytes are read fully here just like a file source.

use std::io::{self, Read};

/// Line terminator convention observed so far.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineTerm {
    Crlf,
    Lf,
    /// The "double-CR" fallback terminator:
    /// a CR immediately followed by another CR, used once per message
    /// as a degenerate header terminator.
    DoubleCr,
}

/// A line read from the source, with its terminator classified so the
/// header parser's unfolding logic can strip it correctly.
#[derive(Clone, Debug)]
pub struct Line {
    /// Bytes of the line, terminator NOT included.
    pub content: Vec<u8>,
    pub term: Option<LineTerm>,
    /// Byte offset of the line's first byte within the source.
    pub offset: usize,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.content.is_empty()
    }
}

/// Buffered, pushback-capable, cursor-based reader.
#[derive(Clone, Debug)]
pub struct ByteSource {
    buf: Vec<u8>,
    pos: usize,
    /// Set once a CR+CR has been consumed as a line terminator, so the
    /// "once per message" rule can be enforced.
    double_cr_used: bool,
}

impl ByteSource {
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        ByteSource {
            buf,
            pos: 0,
            double_cr_used: false,
        }
    }

    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::from_bytes(buf))
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    pub fn total_len(&self) -> usize {
        self.buf.len()
    }

    /// Advance past `n` bytes without interpreting them.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// `skip_while(p)`: absorb bytes matching `p`.
    pub fn skip_while(&mut self, mut p: impl FnMut(u8) -> bool) {
        while self.pos < self.buf.len() && p(self.buf[self.pos]) {
            self.pos += 1;
        }
    }

    /// `read_line_into`-equivalent: read one line, recognizing CRLF, LF,
    /// or (once per message) CR+CR as the terminator.
    pub fn read_line(&mut self, allow_double_cr: bool) -> Option<Line> {
        if self.is_eof() {
            return None;
        }
        let start = self.pos;
        let bytes = &self.buf[self.pos..];

        for i in 0..bytes.len() {
            match bytes[i] {
                b'\n' => {
                    let content = bytes[..i].to_vec();
                    let content = strip_trailing_cr(content);
                    self.pos = start + i + 1;
                    return Some(Line {
                        content,
                        term: Some(LineTerm::Lf),
                        offset: start,
                    });
                }
                b'\r' => {
                    if allow_double_cr && !self.double_cr_used && bytes.get(i + 1) == Some(&b'\r')
                    {
                        self.double_cr_used = true;
                        let content = bytes[..i].to_vec();
                        self.pos = start + i + 2;
                        return Some(Line {
                            content,
                            term: Some(LineTerm::DoubleCr),
                            offset: start,
                        });
                    }
                    if bytes.get(i + 1) == Some(&b'\n') {
                        let content = bytes[..i].to_vec();
                        self.pos = start + i + 2;
                        return Some(Line {
                            content,
                            term: Some(LineTerm::Crlf),
                            offset: start,
                        });
                    }
                    // Lone CR not followed by LF or a second CR: treat as
                    // ordinary content and keep scanning.
                }
                _ => {}
            }
        }

        // No terminator found before EOF: the remainder is one final line.
        let content = bytes.to_vec();
        self.pos = self.buf.len();
        Some(Line {
            content,
            term: None,
            offset: start,
        })
    }

    /// Push a line (and its terminator) back onto the source, as used by
    /// the boundary matcher when a `--` line is not actually a boundary
    ///.
    pub fn push_back_line(&mut self, line: &Line) {
        self.pos = line.offset;
    }
}

fn strip_trailing_cr(mut v: Vec<u8>) -> Vec<u8> {
    if v.last() == Some(&b'\r') {
        v.pop();
    }
    v
}
