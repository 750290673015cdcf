//! RFC 2047 encoded-word decoding, written as a handful of small `nom` parsers
//! (`src/parse/base64.rs`'s `take_while`/`opt` shape).

use nom::{
    bytes::complete::{tag, take_until, take_while1},
    character::complete::char as nchar,
    combinator::map,
    sequence::tuple,
    IResult,
};

use crate::decode::base64::decode_base64_complete;
use crate::decode::quoted_printable::decode_quoted_printable_word;

/// `=?charset?B?...?=` or `=?charset?Q?...?=`.
fn encoded_word(input: &str) -> IResult<&str, (String, char, String)> {
    map(
        tuple((
            tag("=?"),
            take_while1(|c: char| c != '?'),
            nchar('?'),
            nom::character::complete::one_of("bBqQ"),
            nchar('?'),
            take_until("?="),
            tag("?="),
        )),
        |(_, charset, _, enc, _, text, _): (_, &str, _, char, _, &str, _)| {
            (charset.to_string(), enc.to_ascii_uppercase(), text.to_string())
        },
    )(input)
}

fn is_known_charset(charset: &str) -> bool {
    matches!(
        charset.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii" | "iso-8859-1" | "latin1" | "windows-1252"
    )
}

fn decode_payload(charset: &str, enc: char, text: &str) -> Option<String> {
    let raw: Vec<u8> = match enc {
        'B' => decode_base64_complete(text.as_bytes()),
        'Q' => decode_quoted_printable_word(text.as_bytes()),
        _ => return None,
    };
    let lower = charset.to_ascii_lowercase();
    if lower == "iso-8859-1" || lower == "latin1" || lower == "windows-1252" {
        Some(raw.iter().map(|&b| b as char).collect())
    } else {
        String::from_utf8(raw).ok()
    }
}

/// Decode every encoded-word occurrence in `input`, leaving unknown
/// charsets and malformed tokens untouched (copied through as-is).
pub fn decode_encoded_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while !rest.is_empty() {
        match rest.find("=?") {
            None => {
                out.push_str(rest);
                break;
            }
            Some(idx) => {
                out.push_str(&rest[..idx]);
                let candidate = &rest[idx..];
                match encoded_word(candidate) {
                    Ok((remaining, (charset, enc, text))) if is_known_charset(&charset) => {
                        match decode_payload(&charset, enc, &text) {
                            Some(decoded) => out.push_str(&decoded),
                            None => out.push_str(&candidate[..candidate.len() - remaining.len()]),
                        }
                        // RFC 2047: whitespace between adjacent encoded
                        // words is elided; skip exactly one run of it.
                        let after = remaining.trim_start_matches([' ', '\t']);
                        if after.starts_with("=?") && after.len() != remaining.len() {
                            rest = after;
                        } else {
                            rest = remaining;
                        }
                    }
                    _ => {
                        // Not a valid/known encoded-word: copy the `=?`
                        // through literally and keep scanning after it.
                        out.push_str("=?");
                        rest = &candidate[2..];
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_encoded_word() {
        // "hello" in base64 is "aGVsbG8="
        assert_eq!(decode_encoded_words("=?utf-8?B?aGVsbG8=?="), "hello");
    }

    #[test]
    fn decodes_quoted_printable_encoded_word() {
        assert_eq!(decode_encoded_words("=?utf-8?Q?hi_there?="), "hi there");
    }

    #[test]
    fn unknown_charset_is_copied_through() {
        let input = "=?x-made-up?B?aGVsbG8=?=";
        assert_eq!(decode_encoded_words(input), input);
    }

    #[test]
    fn non_encoded_text_is_untouched() {
        assert_eq!(decode_encoded_words("plain subject line"), "plain subject line");
    }

    #[test]
    fn adjacent_encoded_words_elide_whitespace() {
        let input = "=?utf-8?Q?Hello?= =?utf-8?Q?World?=";
        assert_eq!(decode_encoded_words(input), "HelloWorld");
    }
}
