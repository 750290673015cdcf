//! uuencode content-transfer decoder, plus the
//! "uuencoded fragment embedded in a text body" extraction the walker
//! uses for `text/plain` post-scanning.

use crate::boundary::{BoundaryMatch, BoundaryStack};
use crate::source::ByteSource;

use super::base64::DecodeEnd;

fn uu_val(c: u8) -> u8 {
    c.wrapping_sub(0x20) & 0x3f
}

/// Decode one uuencoded data line. The leading length byte gives the
/// number of *output* bytes this line encodes (clipped to `0..=45`,
/// the classic 45-bytes-per-line cap); trailing padding characters
/// beyond that count are discarded.
fn decode_line(line: &[u8]) -> Vec<u8> {
    if line.is_empty() {
        return Vec::new();
    }
    let declared = uu_val(line[0]).min(45) as usize;
    let body = &line[1.min(line.len())..];
    let mut out = Vec::with_capacity(declared);

    for group in body.chunks(4) {
        if group.len() < 4 {
            break;
        }
        let n: Vec<u8> = group.iter().map(|&c| uu_val(c)).collect();
        out.push((n[0] << 2) | (n[1] >> 4));
        out.push((n[1] << 4) | (n[2] >> 2));
        out.push((n[2] << 6) | n[3]);
    }

    out.truncate(declared);
    out
}

/// Parse a `begin <mode> <name>` line.
pub fn parse_begin(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix("begin ")?;
    let mut parts = rest.splitn(2, ' ');
    let mode = parts.next()?.to_string();
    let name = parts.next()?.trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some((mode, name))
    }
}

fn is_end_line(line: &str) -> bool {
    line.trim() == "end"
}

/// Decode a uuencoded body stream starting immediately *after* the
/// `begin` line has already been consumed by the caller. Stops at an
/// `end` line, a zero-length data line, a boundary line, or EOF.
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

        if is_end_line(&text) {
            if !out.is_empty() {
                emit(&out);
            }
            return DecodeEnd::Ok;
        }

        let decoded = decode_line(&line.content);
        if decoded.is_empty() {
            if !out.is_empty() {
                emit(&out);
            }
            return DecodeEnd::Ok;
        }
        out.extend_from_slice(&decoded);
        wrote_any = true;

        if out.len() >= 8192 {
            emit(&out);
            out.clear();
        }
    }
}

/// Scan a plain-text body for embedded `begin ... end` uuencoded
/// frames, returning each frame's declared name and decoded bytes. Used
/// when a `text/plain` part's content carries an attachment without an
/// explicit `Content-Transfer-Encoding: x-uuencode` header.
pub fn extract_embedded(body: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut results = Vec::new();
    let mut source = ByteSource::from_bytes(body.to_vec());

    while let Some(line) = source.read_line(false) {
        let text = String::from_utf8_lossy(&line.content);
        if let Some((_, name)) = parse_begin(&text) {
            let mut bytes = Vec::new();
            loop {
                let Some(data_line) = source.read_line(false) else {
                    break;
                };
                let dtext = String::from_utf8_lossy(&data_line.content);
                if is_end_line(&dtext) {
                    break;
                }
                let decoded = decode_line(&data_line.content);
                if decoded.is_empty() {
                    source.push_back_line(&data_line);
                    break;
                }
                bytes.extend_from_slice(&decoded);
            }
            results.push((name, bytes));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_begin_line() {
        let (mode, name) = parse_begin("begin 644 example.txt").unwrap();
        assert_eq!(mode, "644");
        assert_eq!(name, "example.txt");
    }

    #[test]
    fn decodes_a_single_line() {
        // "Cat" uuencoded: length 3, then "0V%T" (standard example is
        // different per-implementation; verify via round-trip instead).
        let line = encode_line_for_test(b"Cat");
        assert_eq!(decode_line(&line), b"Cat");
    }

    #[test]
    fn stream_stops_at_end_line() {
        let body = format!("{}\nend\n", std::str::from_utf8(&encode_line_for_test(b"Hi!")).unwrap());
        let mut source = ByteSource::from_bytes(body.into_bytes());
        let boundary = BoundaryStack::new();
        let mut collected = Vec::new();
        let end = decode_stream(&mut source, &boundary, |c| collected.extend_from_slice(c));
        assert_eq!(collected, b"Hi!");
        assert_eq!(end, DecodeEnd::Ok);
    }

    #[test]
    fn extract_embedded_finds_frame_in_text_body() {
        let body = format!(
            "some preamble text\nbegin 644 note.txt\n{}\nend\ntrailing text\n",
            std::str::from_utf8(&encode_line_for_test(b"hey")).unwrap()
        );
        let frames = extract_embedded(body.as_bytes());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "note.txt");
        assert_eq!(frames[0].1, b"hey");
    }

    /// Test-only helper: encode bytes into a single uuencoded data line
    /// so decode tests don't need hand-typed fixture lines.
    fn encode_line_for_test(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0x20 + data.len() as u8];
        for chunk in data.chunks(3) {
            let mut buf = [0u8; 3];
            buf[..chunk.len()].copy_from_slice(chunk);
            let n0 = buf[0] >> 2;
            let n1 = ((buf[0] & 0x3) << 4) | (buf[1] >> 4);
            let n2 = ((buf[1] & 0xF) << 2) | (buf[2] >> 6);
            let n3 = buf[2] & 0x3F;
            for n in [n0, n1, n2, n3] {
                out.push(if n == 0 { 0x60 } else { n + 0x20 });
            }
        }
        out
    }
}
