//! `Content-Type` media types: a tagged variant over the known
//! media types plus an "unknown" fallback.

use core::fmt;

/// A parsed `Content-Type` media type, split into the broad variants the
/// walker and the decoder dispatch need to branch on, plus
/// an `Unknown` fallback carrying the original `type/subtype` string.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentType {
    TextPlain,
    TextHtml,
    TextOther(String),
    MultipartMixed,
    MultipartAlternative,
    MultipartRelated,
    MultipartDigest,
    MultipartSigned,
    MultipartEncrypted,
    MultipartAppledouble,
    MultipartReport,
    MultipartOther(String),
    MessageRfc822,
    MessagePartial,
    MessageOther(String),
    ApplicationOctetStream,
    ApplicationMsTnef,
    ApplicationOther(String),
    ImageOther(String),
    AudioOther(String),
    VideoOther(String),
    /// A `type/subtype` pair that doesn't match any case above.
    Unknown(String),
}

impl ContentType {
    /// True for any `multipart/*` type; the walker pushes a boundary and
    /// dispatches to the multipart handler for these.
    pub fn is_multipart(&self) -> bool {
        matches!(
            self,
            ContentType::MultipartMixed
                | ContentType::MultipartAlternative
                | ContentType::MultipartRelated
                | ContentType::MultipartDigest
                | ContentType::MultipartSigned
                | ContentType::MultipartEncrypted
                | ContentType::MultipartAppledouble
                | ContentType::MultipartReport
                | ContentType::MultipartOther(_)
        )
    }

    pub fn is_message_rfc822(&self) -> bool {
        matches!(self, ContentType::MessageRfc822)
    }

    pub fn is_appledouble(&self) -> bool {
        matches!(self, ContentType::MultipartAppledouble)
    }

    pub fn is_applefile(&self) -> bool {
        matches!(self, ContentType::ApplicationOther(s) if s.eq_ignore_ascii_case("application/applefile"))
    }

    pub fn is_octet_stream(&self) -> bool {
        matches!(self, ContentType::ApplicationOctetStream)
    }

    pub fn is_ms_tnef(&self) -> bool {
        matches!(self, ContentType::ApplicationMsTnef)
    }

    /// Parse a `type/subtype` string (already lowercased leading tokens
    /// are not assumed — matching is case-insensitive per RFC 2045).
    pub fn parse(raw: &str) -> ContentType {
        let raw = raw.trim();
        let mut split = raw.splitn(2, '/');
        let main = split.next().unwrap_or("").to_ascii_lowercase();
        let sub = split.next().unwrap_or("").to_ascii_lowercase();

        match (main.as_str(), sub.as_str()) {
            ("text", "plain") => ContentType::TextPlain,
            ("text", "html") => ContentType::TextHtml,
            ("text", _) => ContentType::TextOther(raw.to_string()),
            ("multipart", "mixed") => ContentType::MultipartMixed,
            ("multipart", "alternative") => ContentType::MultipartAlternative,
            ("multipart", "related") => ContentType::MultipartRelated,
            ("multipart", "digest") => ContentType::MultipartDigest,
            ("multipart", "signed") => ContentType::MultipartSigned,
            ("multipart", "encrypted") => ContentType::MultipartEncrypted,
            ("multipart", "appledouble") => ContentType::MultipartAppledouble,
            ("multipart", "report") => ContentType::MultipartReport,
            ("multipart", _) => ContentType::MultipartOther(raw.to_string()),
            ("message", "rfc822") => ContentType::MessageRfc822,
            ("message", "partial") => ContentType::MessagePartial,
            ("message", _) => ContentType::MessageOther(raw.to_string()),
            ("application", "octet-stream") => ContentType::ApplicationOctetStream,
            ("application", "ms-tnef") => ContentType::ApplicationMsTnef,
            ("application", _) => ContentType::ApplicationOther(raw.to_string()),
            ("image", _) if !sub.is_empty() => ContentType::ImageOther(raw.to_string()),
            ("audio", _) if !sub.is_empty() => ContentType::AudioOther(raw.to_string()),
            ("video", _) if !sub.is_empty() => ContentType::VideoOther(raw.to_string()),
            _ if !main.is_empty() && !sub.is_empty() => ContentType::Unknown(raw.to_string()),
            _ => ContentType::Unknown(String::new()),
        }
    }

    /// The `type/subtype` string, used for `name_by_type` defaulting and
    /// for the CLI/sink metadata report.
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::TextPlain => "text/plain",
            ContentType::TextHtml => "text/html",
            ContentType::TextOther(s)
            | ContentType::MultipartOther(s)
            | ContentType::MessageOther(s)
            | ContentType::ApplicationOther(s)
            | ContentType::ImageOther(s)
            | ContentType::AudioOther(s)
            | ContentType::VideoOther(s)
            | ContentType::Unknown(s) => s.as_str(),
            ContentType::MultipartMixed => "multipart/mixed",
            ContentType::MultipartAlternative => "multipart/alternative",
            ContentType::MultipartRelated => "multipart/related",
            ContentType::MultipartDigest => "multipart/digest",
            ContentType::MultipartSigned => "multipart/signed",
            ContentType::MultipartEncrypted => "multipart/encrypted",
            ContentType::MultipartAppledouble => "multipart/appledouble",
            ContentType::MultipartReport => "multipart/report",
            ContentType::MessageRfc822 => "message/rfc822",
            ContentType::MessagePartial => "message/partial",
            ContentType::ApplicationOctetStream => "application/octet-stream",
            ContentType::ApplicationMsTnef => "application/ms-tnef",
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Unknown(String::new())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
