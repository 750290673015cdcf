//! Header block scanning: unfolding,
//! colon/equals-separator tolerance, and the recognized-header sanity
//! counter that drives the "long search" retry.

use std::collections::BTreeMap;

use mailrip_types::{Defect, DefectHistogram};

use crate::source::ByteSource;

use super::comments::strip_comments;
use super::params;
use super::rfc2047::decode_encoded_words;

/// One raw `Name: Value` pair after unfolding, before interpretation.
#[derive(Clone, Debug)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// The outcome of scanning one header block.
#[derive(Clone, Debug, Default)]
pub struct HeaderBlock {
    pub raw: Vec<RawHeader>,
    pub defects: DefectHistogram,
    /// Count of lines recognized as *any* well-formed `Name: Value`
    /// header; zero drives the walker's
    /// "long search" retry over a wider slice of the body.
    pub sanity_count: u32,
    /// Whether a CR+CR fallback terminator was used to end the block.
    pub terminated_by_double_cr: bool,
}

fn is_continuation(content: &[u8]) -> bool {
    matches!(content.first(), Some(b' ') | Some(b'\t'))
}

/// Scan one header block starting at the source's current position,
/// stopping at the first blank line (or CR+CR, or EOF). Leaves the
/// source positioned at the start of the body.
pub fn scan_header_block(source: &mut ByteSource, header_longsearch: bool) -> HeaderBlock {
    let mut block = HeaderBlock::default();
    let mut pending: Option<RawHeader> = None;
    let mut seen_names: Vec<String> = Vec::new();

    loop {
        let Some(line) = source.read_line(true) else {
            break;
        };
        if matches!(line.term, Some(crate::source::LineTerm::DoubleCr)) {
            block.terminated_by_double_cr = true;
        }
        if line.is_blank() {
            break;
        }

        let text = String::from_utf8_lossy(&line.content).into_owned();

        if is_continuation(&line.content) {
            if let Some(h) = pending.as_mut() {
                h.value.push(' ');
                h.value.push_str(text.trim_start());
            }
            continue;
        }

        if let Some(h) = pending.take() {
            commit(&mut block, &mut seen_names, h);
        }

        match split_name_value(&text, &mut block.defects) {
            Some((name, value)) => {
                block.sanity_count += 1;
                pending = Some(RawHeader { name, value });
            }
            None => {
                block.defects.record(Defect::MissingSeparators);
                if !header_longsearch {
                    // Without long-search tolerance, an unparseable line
                    // ends the header block outright.
                    break;
                }
            }
        }
    }

    if let Some(h) = pending.take() {
        commit(&mut block, &mut seen_names, h);
    }

    block
}

fn commit(block: &mut HeaderBlock, seen_names: &mut Vec<String>, h: RawHeader) {
    let lower = h.name.to_ascii_lowercase();
    if seen_names.contains(&lower) {
        block.defects.record(Defect::MultipleFieldOccurrence);
    } else {
        seen_names.push(lower);
    }
    block.raw.push(h);
}

/// Split `"Name: Value"`, tolerating `Name:: Value` (records
/// `multiple_colon_separators`) and rejecting lines with no colon at
/// all.
fn split_name_value(line: &str, defects: &mut DefectHistogram) -> Option<(String, String)> {
    let colon = line.find(':')?;
    let name = line[..colon].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let mut rest = &line[colon + 1..];
    while let Some(stripped) = rest.strip_prefix(':') {
        defects.record(Defect::MultipleColonSeparators);
        rest = stripped;
    }
    Some((name.to_string(), rest.trim_start().to_string()))
}

/// A header value's primary token plus its `;`-separated parameters,
/// quote-aware so `;` and `=` inside a quoted string don't get split.
pub struct SplitValue {
    pub primary: String,
    pub params: BTreeMap<String, String>,
    /// Second boundary candidate, set only when the `boundary=` value had
    /// an unmatched opening quote (spec §4.2): the quoted-literal and
    /// unquoted readings are both plausible, so both are kept for the
    /// walker's boundary stack to resolve on first use.
    pub boundary_secondary: Option<String>,
}

/// Split `Content-Type`/`Content-Disposition`-style values: a primary
/// token followed by `; name=value` pairs, reassembling RFC 2231
/// continuations and recording the malformation defects this scan watches for.
pub fn split_value_and_params(raw: &str, defects: &mut DefectHistogram) -> SplitValue {
    let (stripped, unterminated) = strip_comments(raw);
    if unterminated {
        defects.record(Defect::MissingSeparators);
    }

    let segments = split_respecting_quotes(&stripped, defects);
    let mut iter = segments.into_iter();
    let primary = iter.next().unwrap_or_default().trim().to_string();

    let mut pairs = Vec::new();
    let mut boundary_count = 0;
    let mut boundary_secondary = None;
    for segment in iter {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some(eq) = segment.find('=') else {
            continue;
        };
        let name = segment[..eq].trim().to_string();
        let mut value = segment[eq + 1..].trim();
        while let Some(stripped) = value.strip_prefix('=') {
            defects.record(Defect::MultipleEqualsSeparators);
            value = stripped.trim_start();
        }
        let is_boundary = name.eq_ignore_ascii_case("boundary");
        let (value, secondary) = unquote(value, defects, is_boundary);
        if is_boundary {
            boundary_count += 1;
            if boundary_count > 1 {
                defects.record(Defect::MultipleBoundaries);
            }
            if secondary.is_some() {
                boundary_secondary = secondary;
            }
        }
        pairs.push((name, value));
    }

    let params = params::reassemble(&pairs);
    SplitValue { primary, params, boundary_secondary }
}

/// Strip one layer of `"`-quoting. Returns the unquoted value plus, when
/// `is_boundary` and the opening quote is never matched, a second
/// candidate: the literal reading with the stray `"` kept as part of the
/// boundary string. Spec §4.2 — either reading could be what the sender
/// meant, so both are carried forward rather than guessed at here.
fn unquote(value: &str, defects: &mut DefectHistogram, is_boundary: bool) -> (String, Option<String>) {
    let value = value.trim();
    if let Some(inner) = value.strip_prefix('"') {
        match inner.rfind('"') {
            Some(end) => {
                let body = &inner[..end];
                let trailer = &inner[end + 1..];
                if trailer.contains('"') {
                    defects.record(Defect::MultipleQuotes);
                }
                (body.replace("\\\"", "\""), None)
            }
            None => {
                if is_boundary {
                    defects.record(Defect::UnbalancedBoundaryQuote);
                    (inner.to_string(), Some(value.to_string()))
                } else {
                    defects.record(Defect::UnbalancedQuotes);
                    (inner.to_string(), None)
                }
            }
        }
    } else {
        (value.to_string(), None)
    }
}

/// Split a header value on top-level `;`, not inside a quoted string.
fn split_respecting_quotes(value: &str, _defects: &mut DefectHistogram) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '\\' if in_quotes => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' if !in_quotes => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    out.push(current);
    out
}

/// Apply RFC 2047 decoding to a display-oriented header value (`Subject`,
/// `From`, `To`) — never applied to `Content-Type`/`Content-Disposition`
/// values, which are structural.
pub fn decode_display_value(raw: &str) -> String {
    decode_encoded_words(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfolds_continuation_lines() {
        let mut source = ByteSource::from_bytes(
            b"Subject: hello\n  world\nFrom: a@b.com\n\nbody".to_vec(),
        );
        let block = scan_header_block(&mut source, true);
        assert_eq!(block.raw.len(), 2);
        assert_eq!(block.raw[0].name, "Subject");
        assert_eq!(block.raw[0].value, "hello world");
    }

    #[test]
    fn records_multiple_field_occurrence() {
        let mut source =
            ByteSource::from_bytes(b"Subject: one\nSubject: two\n\nbody".to_vec());
        let block = scan_header_block(&mut source, true);
        assert_eq!(block.defects.count(Defect::MultipleFieldOccurrence), 1);
    }

    #[test]
    fn missing_colon_is_tolerated_and_flagged() {
        let mut source =
            ByteSource::from_bytes(b"not-a-header-line\nSubject: ok\n\nbody".to_vec());
        let block = scan_header_block(&mut source, true);
        assert_eq!(block.defects.count(Defect::MissingSeparators), 1);
        assert_eq!(block.raw.len(), 1);
    }

    #[test]
    fn splits_params_and_unquotes() {
        let mut defects = DefectHistogram::new();
        let sv = split_value_and_params(
            r#"multipart/mixed; boundary="abc123""#,
            &mut defects,
        );
        assert_eq!(sv.primary, "multipart/mixed");
        assert_eq!(sv.params.get("boundary").unwrap(), "abc123");
    }

    #[test]
    fn detects_unbalanced_boundary_quote() {
        let mut defects = DefectHistogram::new();
        let sv = split_value_and_params(r#"multipart/mixed; boundary="abc123"#, &mut defects);
        assert_eq!(defects.count(Defect::UnbalancedBoundaryQuote), 1);
        assert_eq!(sv.params.get("boundary").unwrap(), "abc123");
        assert_eq!(sv.boundary_secondary.as_deref(), Some(r#""abc123"#));
    }

    #[test]
    fn detects_multiple_boundaries() {
        let mut defects = DefectHistogram::new();
        split_value_and_params(
            r#"multipart/mixed; boundary="a"; boundary="b""#,
            &mut defects,
        );
        assert_eq!(defects.count(Defect::MultipleBoundaries), 1);
    }

    #[test]
    fn semicolons_inside_quotes_do_not_split() {
        let mut defects = DefectHistogram::new();
        let sv = split_value_and_params(
            r#"application/octet-stream; name="a;b.txt""#,
            &mut defects,
        );
        assert_eq!(sv.params.get("name").unwrap(), "a;b.txt");
    }
}
