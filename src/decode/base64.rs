//! base64 content-transfer decoder.
//!
//! Streaming, boundary-aware, tolerant of whitespace and invalid
//! characters, following a table-driven decode shape
//! (`take_while`/`opt` over the base64 alphabet) but generalized from
//! "parse one complete token" to "consume as much of a stream as is
//! available, reporting why it stopped".

use mailrip_types::ErrorKind;

use crate::boundary::{BoundaryMatch, BoundaryStack};
use crate::source::ByteSource;

/// Output accumulator size before flushing to the sink, chosen to amortize
/// the per-call overhead.
const ACCUMULATOR_MIN: usize = 4096;

const INVALID: u8 = 128;

const fn build_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0u8;
    while i < 26 {
        table[(b'A' + i) as usize] = i;
        table[(b'a' + i) as usize] = 26 + i;
        i += 1;
    }
    let mut d = 0u8;
    while d < 10 {
        table[(b'0' + d) as usize] = 52 + d;
        d += 1;
    }
    table[b'+' as usize] = 62;
    table[b'/' as usize] = 63;
    table
}

const DECODE_TABLE: [u8; 256] = build_table();

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Termination reason for a single decoder invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeEnd {
    Ok,
    HitBoundary(BoundaryMatch),
    Eof,
    ZeroLength,
}

struct Group {
    sextets: [u8; 4],
    filled: usize,
    pads: usize,
}

impl Group {
    fn new() -> Self {
        Group {
            sextets: [0; 4],
            filled: 0,
            pads: 0,
        }
    }

    /// Returns the decoded 1-3 bytes once a full quartet has
    /// accumulated, along with how many of the 3 slots are valid
    /// (fewer than 3 when the quartet ended in `=` padding).
    fn push_char(&mut self, c: u8) -> Option<([u8; 3], usize)> {
        self.sextets[self.filled] = DECODE_TABLE[c as usize];
        self.filled += 1;
        self.maybe_flush()
    }

    fn push_pad(&mut self) -> Option<([u8; 3], usize)> {
        self.sextets[self.filled] = 0;
        self.filled += 1;
        self.pads += 1;
        self.maybe_flush()
    }

    fn maybe_flush(&mut self) -> Option<([u8; 3], usize)> {
        if self.filled < 4 {
            return None;
        }
        let s = self.sextets;
        let out = [
            (s[0] << 2) | (s[1] >> 4),
            (s[1] << 4) | (s[2] >> 2),
            (s[2] << 6) | s[3],
        ];
        self.filled = 0;
        let pads = self.pads;
        self.pads = 0;
        let count = match pads {
            0 => 3,
            1 => 2,
            _ => 1,
        };
        Some((out, count))
    }
}

/// Decode as much base64 as is available starting at the source's
/// current position, writing decoded bytes to `emit` in ≥4 KiB chunks.
///
/// `boundary` is used only to *test* candidate boundary lines; the
/// caller is responsible for popping the stack based on the returned
/// match.
pub fn decode_stream(
    source: &mut ByteSource,
    boundary: &BoundaryStack,
    mut emit: impl FnMut(&[u8]),
) -> DecodeEnd {
    let mut group = Group::new();
    let mut out = Vec::with_capacity(ACCUMULATOR_MIN + 3);
    let mut wrote_any = false;
    let mut consecutive_blank_lines = 0u32;

    loop {
        if source.is_eof() {
            if !out.is_empty() {
                emit(&out);
            }
            return if wrote_any || !out.is_empty() {
                DecodeEnd::Ok
            } else {
                DecodeEnd::Eof
            };
        }

        let line = match source.read_line(false) {
            Some(l) => l,
            None => {
                if !out.is_empty() {
                    emit(&out);
                }
                return DecodeEnd::Eof;
            }
        };

        if line.is_blank() {
            consecutive_blank_lines += 1;
            if consecutive_blank_lines >= 2 {
                if !out.is_empty() {
                    emit(&out);
                }
                return DecodeEnd::Ok;
            }
            continue;
        }
        consecutive_blank_lines = 0;

        let text = String::from_utf8_lossy(&line.content);
        if text.starts_with("--") {
            let m = boundary.test_line(&text);
            if !matches!(m, BoundaryMatch::NoMatch) {
                source.push_back_line(&line);
                if !out.is_empty() {
                    emit(&out);
                }
                return DecodeEnd::HitBoundary(m);
            }
            // Not actually a boundary: fall through and decode its bytes
            // as ordinary base64 content.
        }

        for &byte in line.content.iter() {
            if is_whitespace(byte) {
                continue;
            }
            if byte == b'=' {
                if let Some((chunk, n)) = group.push_pad() {
                    out.extend_from_slice(&chunk[..n]);
                    wrote_any = true;
                }
                // A pad closes the group and terminates the decode right
                // there (spec §4.4; §8 "stray `==` in the middle of
                // data"), regardless of whether it happened to land on a
                // quartet boundary.
                if !out.is_empty() {
                    emit(&out);
                }
                return DecodeEnd::Ok;
            }
            if DECODE_TABLE[byte as usize] == INVALID {
                continue;
            }
            if let Some((chunk, n)) = group.push_char(byte) {
                out.extend_from_slice(&chunk[..n]);
                wrote_any = true;
            }
        }

        if out.len() >= ACCUMULATOR_MIN {
            emit(&out);
            out.clear();
        }
    }
}

/// Non-streaming decode of a complete base64 token, used by the RFC 2047
/// encoded-word decoder where boundary/whitespace handling doesn't
/// apply. Ignores invalid characters exactly like the streaming path.
pub fn decode_base64_complete(input: &[u8]) -> Vec<u8> {
    let mut group = Group::new();
    let mut out = Vec::with_capacity(input.len() * 3 / 4 + 3);
    for &byte in input {
        if is_whitespace(byte) {
            continue;
        }
        if byte == b'=' {
            if let Some((chunk, n)) = group.push_pad() {
                out.extend_from_slice(&chunk[..n]);
            }
            continue;
        }
        if DECODE_TABLE[byte as usize] == INVALID {
            continue;
        }
        if let Some((chunk, n)) = group.push_char(byte) {
            out.extend_from_slice(&chunk[..n]);
        }
    }
    out
}

/// Classify the reason the decoder produced no output at all — used by
/// the walker to decide whether to report `decoder_input_stream_broken`.
pub fn broken_mid_group(end: DecodeEnd, bytes_consumed: usize) -> Option<ErrorKind> {
    match end {
        DecodeEnd::Eof if bytes_consumed == 0 => Some(ErrorKind::DecoderInputStreamBroken),
        _ => None,
    }
}
