//! Content-Transfer-Encoding decoders. Each encoding gets
//! its own module with a `decode_stream` function sharing the same
//! `(source, boundary) -> DecodeEnd` shape, dispatched from
//! [`decode_part_body`] by [`mailrip_types::ContentTransferEncoding`].

pub mod base64;
pub mod passthrough;
pub mod quoted_printable;
pub mod uuencode;

pub use base64::DecodeEnd;

use mailrip_types::ContentTransferEncoding;

use crate::boundary::BoundaryStack;
use crate::source::ByteSource;

/// Decode a part's body according to its resolved transfer encoding,
/// streaming output through `emit`. This is the single entry point the
/// walker calls once it has resolved a part's `ContentTransferEncoding`
///.
pub fn decode_part_body(
    encoding: ContentTransferEncoding,
    source: &mut ByteSource,
    boundary: &BoundaryStack,
    emit: impl FnMut(&[u8]),
) -> DecodeEnd {
    match encoding {
        ContentTransferEncoding::Base64 => base64::decode_stream(source, boundary, emit),
        ContentTransferEncoding::QuotedPrintable => {
            quoted_printable::decode_stream(source, boundary, emit)
        }
        ContentTransferEncoding::Uuencoded => uuencode::decode_stream(source, boundary, emit),
        ContentTransferEncoding::SevenBit
        | ContentTransferEncoding::EightBit
        | ContentTransferEncoding::Binary
        | ContentTransferEncoding::Unspecified
        | ContentTransferEncoding::Unknown => passthrough::decode_stream(source, boundary, emit),
    }
}
