//! TNEF attribute-record scanning: level byte, tag, size, payload,
//! trailing checksum, each bounds-checked against the stream end.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::tnef::{Attribute, AttributeTag};

fn u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4).map(LittleEndian::read_u32)
}

fn u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset + 2).map(LittleEndian::read_u16)
}

/// Parse every attribute record starting at `bytes`'s current position
/// (the caller has already consumed the 4-byte signature and 2-byte
/// attach key). Stops at the first malformed or truncated record,
/// mirroring `TNEF_decode_tnef`'s "sub-zero response ends decoding".
pub fn parse_attributes(bytes: &[u8]) -> Vec<Attribute> {
    let mut out = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let Some(&level) = bytes.get(pos) else { break };
        pos += 1;

        let Some(raw_tag) = u32_le(bytes, pos) else { break };
        pos += 4;

        let Some(size) = u32_le(bytes, pos) else { break };
        pos += 4;

        let size = size as usize;
        let Some(payload) = bytes.get(pos..pos + size) else {
            break;
        };
        pos += size;

        let Some(checksum) = u16_le(bytes, pos) else {
            break;
        };
        pos += 2;

        out.push(Attribute {
            level,
            tag: AttributeTag::from_raw(raw_tag),
            raw_tag,
            payload: payload.to_vec(),
            checksum,
        });
    }

    out
}
