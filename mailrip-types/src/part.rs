//! The MIME node record.

use crate::{
    content_type::ContentType, defect::DefectHistogram, disposition::ContentDisposition,
    encoding::ContentTransferEncoding,
};

/// One node in the MIME tree.
///
/// Lifecycle: created by the walker on entry to the part,
/// mutated only during header parse, consumed by the decoder chosen by
/// `(transfer_encoding, content_type)`, destroyed on return from the part.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MimePart {
    pub content_type: ContentType,
    pub transfer_encoding: ContentTransferEncoding,
    pub disposition: ContentDisposition,
    /// The `name=` parameter of `Content-Type`, after RFC 2231 reassembly.
    pub name: Option<String>,
    /// The `filename=` parameter of `Content-Disposition`, after RFC 2231
    /// reassembly.
    pub filename: Option<String>,
    /// `Content-Location:` header value, a third filename facet.
    pub content_location: Option<String>,
    pub charset: Option<String>,
    /// The boundary this part introduces, if it is a `multipart/*` node.
    pub boundary: Option<String>,
    /// Second boundary candidate, set only when the `boundary=` value had
    /// an unmatched opening quote: both the quoted-literal and unquoted
    /// readings are pushed onto the boundary stack so the wrong one is
    /// discarded on first use instead of guessed at parse time.
    pub boundary_secondary: Option<String>,
    /// Recursion depth at which the walker entered this part.
    pub depth: u32,
    pub defects: DefectHistogram,
    /// `x-mac-type` / `x-mac-creator` parameter pair: when both are
    /// present, `/` in filenames is preserved rather than replaced with `_`.
    pub mac_resource: bool,
    /// `appledouble_filename` carried forward from a
    /// `multipart/appledouble` parent to its immediate
    /// `application/applefile` child.
    pub inherited_appledouble_filename: Option<String>,
}

impl MimePart {
    pub fn new(depth: u32) -> Self {
        MimePart {
            depth,
            ..Default::default()
        }
    }

    /// All filenames this part declared, in the order they should be tried
    /// them considered: `filename=`, then `name=`, then `Content-Location:`.
    /// The first valid one is the primary; the rest are additional
    /// logical names reported as the "multiple-name exploit" defect.
    pub fn declared_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(3);
        if let Some(f) = self.filename.as_deref() {
            if !f.is_empty() {
                names.push(f);
            }
        }
        if let Some(n) = self.name.as_deref() {
            if !n.is_empty() && !names.contains(&n) {
                names.push(n);
            }
        }
        if let Some(l) = self.content_location.as_deref() {
            if !l.is_empty() && !names.contains(&l) {
                names.push(l);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_names_dedupes_and_orders_filename_first() {
        let mut part = MimePart::new(0);
        part.filename = Some("a.txt".into());
        part.name = Some("a.txt".into());
        part.content_location = Some("b.txt".into());
        assert_eq!(part.declared_names(), vec!["a.txt", "b.txt"]);
    }
}
