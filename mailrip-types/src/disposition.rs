//! `Content-Disposition` variants.

use core::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentDisposition {
    Inline,
    Attachment,
    FormData,
    Unknown,
}

impl ContentDisposition {
    pub fn parse(raw: &str) -> ContentDisposition {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("inline") {
            ContentDisposition::Inline
        } else if lower.starts_with("attachment") {
            ContentDisposition::Attachment
        } else if lower.starts_with("form-data") {
            ContentDisposition::FormData
        } else {
            ContentDisposition::Unknown
        }
    }
}

impl Default for ContentDisposition {
    fn default() -> Self {
        ContentDisposition::Unknown
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentDisposition::Inline => "inline",
            ContentDisposition::Attachment => "attachment",
            ContentDisposition::FormData => "form-data",
            ContentDisposition::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
