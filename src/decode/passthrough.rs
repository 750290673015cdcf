//! 7bit / 8bit / binary passthrough. The only job here is finding where the part
//! ends; bytes are copied unchanged.

use crate::boundary::{BoundaryMatch, BoundaryStack};
use crate::source::ByteSource;

use super::base64::DecodeEnd;

/// Copy bytes verbatim until a boundary line or end of input.
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

        out.extend_from_slice(&line.content);
        out.push(b'\n');
        wrote_any = true;

        if out.len() >= 8192 {
            emit(&out);
            out.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_lines_unchanged_until_boundary() {
        let mut source = ByteSource::from_bytes(b"line one\nline two\n--sep\n".to_vec());
        let mut boundary = BoundaryStack::new();
        boundary.push("sep");
        let mut collected = Vec::new();
        let end = decode_stream(&mut source, &boundary, |chunk| collected.extend_from_slice(chunk));
        assert_eq!(collected, b"line one\nline two\n");
        assert!(matches!(end, DecodeEnd::HitBoundary(_)));
    }

    #[test]
    fn copies_to_eof_when_no_boundary_present() {
        let mut source = ByteSource::from_bytes(b"just text\n".to_vec());
        let boundary = BoundaryStack::new();
        let mut collected = Vec::new();
        decode_stream(&mut source, &boundary, |chunk| collected.extend_from_slice(chunk));
        assert_eq!(collected, b"just text\n");
    }
}
