//! `Content-Transfer-Encoding` variants.

use core::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentTransferEncoding {
    Base64,
    QuotedPrintable,
    SevenBit,
    EightBit,
    Binary,
    Uuencoded,
    Unspecified,
    Unknown,
}

impl ContentTransferEncoding {
    /// Case-insensitive prefix match against the closed set named in
    /// Case-insensitive prefix match against a small closed set.
    pub fn parse(raw: &str) -> ContentTransferEncoding {
        let raw = raw.trim();
        if raw.is_empty() {
            return ContentTransferEncoding::Unspecified;
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("base64") {
            ContentTransferEncoding::Base64
        } else if lower.starts_with("quoted-printable") {
            ContentTransferEncoding::QuotedPrintable
        } else if lower.starts_with("7bit") {
            ContentTransferEncoding::SevenBit
        } else if lower.starts_with("8bit") {
            ContentTransferEncoding::EightBit
        } else if lower.starts_with("binary") {
            ContentTransferEncoding::Binary
        } else if lower.starts_with("x-uuencode") || lower.starts_with("uuencode") {
            ContentTransferEncoding::Uuencoded
        } else {
            ContentTransferEncoding::Unknown
        }
    }

    /// `application/octet-stream` with an unspecified encoding implies
    /// `binary`.
    pub fn resolve_implied(self, is_octet_stream: bool) -> ContentTransferEncoding {
        if self == ContentTransferEncoding::Unspecified && is_octet_stream {
            ContentTransferEncoding::Binary
        } else {
            self
        }
    }
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::Unspecified
    }
}

impl fmt::Display for ContentTransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentTransferEncoding::Base64 => "base64",
            ContentTransferEncoding::QuotedPrintable => "quoted-printable",
            ContentTransferEncoding::SevenBit => "7bit",
            ContentTransferEncoding::EightBit => "8bit",
            ContentTransferEncoding::Binary => "binary",
            ContentTransferEncoding::Uuencoded => "x-uuencode",
            ContentTransferEncoding::Unspecified => "",
            ContentTransferEncoding::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_is_case_insensitive() {
        assert_eq!(
            ContentTransferEncoding::parse("Base64"),
            ContentTransferEncoding::Base64
        );
        assert_eq!(
            ContentTransferEncoding::parse("BASE64 (7bit sometimes)"),
            ContentTransferEncoding::Base64
        );
    }

    #[test]
    fn octet_stream_implies_binary() {
        let cte = ContentTransferEncoding::Unspecified.resolve_implied(true);
        assert_eq!(cte, ContentTransferEncoding::Binary);
        let cte = ContentTransferEncoding::Unspecified.resolve_implied(false);
        assert_eq!(cte, ContentTransferEncoding::Unspecified);
    }
}
