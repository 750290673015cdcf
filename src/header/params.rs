//! RFC 2231 parameter continuation and extended-value reassembly, e.g.
//!
//! ```text
//! Content-Type: application/octet-stream;
//!   name*0*=UTF-8''%e2%98%83
//!   name*1*=more-text
//! ```

use std::collections::BTreeMap;

/// One `name=value` or `name*n*=value` pair lifted from a header's
/// parameter list, before reassembly.
#[derive(Clone, Debug)]
struct RawParam {
    base_name: String,
    index: Option<u32>,
    extended: bool,
    value: String,
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Strip a leading `charset'lang'` extended-value prefix, returning the
/// remaining percent-encoded text. Only present on segment 0.
fn strip_charset_lang(value: &str) -> &str {
    let mut quotes = value.match_indices('\'');
    let first = quotes.next();
    let second = quotes.next();
    match (first, second) {
        (Some((_, _)), Some((idx2, _))) => &value[idx2 + 1..],
        _ => value,
    }
}

fn parse_raw(name: &str, value: &str) -> RawParam {
    if let Some(star_pos) = name.find('*') {
        let base_name = name[..star_pos].to_string();
        let suffix = &name[star_pos + 1..];
        if suffix.is_empty() {
            // `name*=value`: a single extended value with no continuation.
            return RawParam {
                base_name,
                index: Some(0),
                extended: true,
                value: value.to_string(),
            };
        }
        if let Some(stripped) = suffix.strip_suffix('*') {
            // `name*n*=value`: continuation segment `n`, extended form.
            let index = stripped.parse().ok();
            return RawParam {
                base_name,
                index,
                extended: true,
                value: value.to_string(),
            };
        }
        // `name*n=value`: continuation segment `n`, plain form.
        let index = suffix.parse().ok();
        return RawParam {
            base_name,
            index,
            extended: false,
            value: value.to_string(),
        };
    }
    RawParam {
        base_name: name.to_string(),
        index: None,
        extended: false,
        value: value.to_string(),
    }
}

/// Reassemble a header's parameter list, merging RFC 2231 continuations
/// into single logical values. Plain `name=value` parameters pass
/// through unchanged.
pub fn reassemble(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    let mut simple = BTreeMap::new();
    let mut continuations: BTreeMap<String, BTreeMap<u32, RawParam>> = BTreeMap::new();

    for (name, value) in pairs {
        let raw = parse_raw(name, value);
        match raw.index {
            None => {
                simple.insert(raw.base_name.clone(), raw.value.clone());
            }
            Some(idx) => {
                continuations
                    .entry(raw.base_name.clone())
                    .or_default()
                    .insert(idx, raw);
            }
        }
    }

    for (base_name, segments) in continuations {
        let mut bytes = Vec::new();
        let mut any_extended = false;
        for (idx, seg) in segments {
            let text = if seg.extended {
                any_extended = true;
                let stripped = if idx == 0 {
                    strip_charset_lang(&seg.value)
                } else {
                    seg.value.as_str()
                };
                percent_decode(stripped)
            } else {
                seg.value.as_bytes().to_vec()
            };
            bytes.extend_from_slice(&text);
        }
        let value = if any_extended {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };
        simple.insert(base_name, value);
    }

    simple
}
