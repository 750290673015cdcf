//! Quoted-printable content-transfer decoder, sharing the line-oriented, boundary-aware shape
//! of [`crate::decode::base64`].

use crate::boundary::{BoundaryMatch, BoundaryStack};
use crate::source::ByteSource;

use super::base64::DecodeEnd;

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Decode one line's worth of quoted-printable bytes (no trailing
/// newline), honoring a soft line break (`=` as the last character) by
/// returning `true` in the second tuple slot when the caller should NOT
/// insert a hard newline after this line.
fn decode_line(line: &[u8], out: &mut Vec<u8>) -> bool {
    let mut i = 0;
    let mut soft_break = false;
    while i < line.len() {
        if line[i] == b'=' {
            if i + 1 == line.len() {
                soft_break = true;
                i += 1;
                continue;
            }
            if i + 2 < line.len() {
                if let (Some(hi), Some(lo)) = (hex_val(line[i + 1]), hex_val(line[i + 2])) {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            // Malformed escape: pass the `=` through literally, matching
            // keep malformed escapes rather than rejecting the whole part.
            out.push(b'=');
            i += 1;
        } else {
            out.push(line[i]);
            i += 1;
        }
    }
    soft_break
}

/// Decode a single quoted-printable "word" with no line structure at
/// all — used by the RFC 2047 `Q` encoding, where `_` additionally
/// stands in for a space.
pub fn decode_quoted_printable_word(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < input.len() => {
                if let (Some(hi), Some(lo)) = (hex_val(input[i + 1]), hex_val(input[i + 2])) {
                    out.push((hi << 4) | lo);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

/// Decode a quoted-printable body stream, emitting bytes to `emit`.
/// Mirrors [`super::base64::decode_stream`]'s boundary-testing contract.
pub fn decode_stream(
    source: &mut ByteSource,
    boundary: &BoundaryStack,
    mut emit: impl FnMut(&[u8]),
) -> DecodeEnd {
    let mut out = Vec::with_capacity(8192);
    let mut wrote_any = false;

    loop {
        if source.is_eof() {
            if !out.is_empty() {
                emit(&out);
            }
            return if wrote_any { DecodeEnd::Ok } else { DecodeEnd::Eof };
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
        }

        let soft_break = decode_line(&line.content, &mut out);
        wrote_any = true;
        if !soft_break {
            out.push(b'\n');
        }

        if out.len() >= 8192 {
            emit(&out);
            out.clear();
        }
    }
}
