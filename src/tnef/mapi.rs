//! MAPI property descent for `attMAPIProps` attributes. Property type
//! IDs are the standard MAPI `PT_*` constants.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::tnef::PR_RTF_COMPRESSED;

const PROP_TYPE_MASK: u32 = 0x0000_ffff;

const PT_I2: u32 = 0x0002;
const PT_LONG: u32 = 0x0003;
const PT_R4: u32 = 0x0004;
const PT_DOUBLE: u32 = 0x0005;
const PT_CURRENCY: u32 = 0x0006;
const PT_APPTIME: u32 = 0x0007;
const PT_ERROR: u32 = 0x000a;
const PT_BOOLEAN: u32 = 0x000b;
const PT_OBJECT: u32 = 0x000d;
const PT_I8: u32 = 0x0014;
const PT_STRING8: u32 = 0x001e;
const PT_UNICODE: u32 = 0x001f;
const PT_SYSTIME: u32 = 0x0040;
const PT_BINARY: u32 = 0x0102;

fn u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4).map(LittleEndian::read_u32)
}

fn padded(len: usize) -> usize {
    len + if len % 4 != 0 { 4 - len % 4 } else { 0 }
}

/// Walk an `attMAPIProps` payload, returning every `PR_RTF_COMPRESSED`
/// binary property's raw bytes in encounter order.
pub fn extract_rtf_properties(payload: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let Some(num_props) = u32_le(payload, 0) else {
        return out;
    };
    let mut pos = 4usize;

    for _ in 0..num_props {
        let Some(prop_tag) = u32_le(payload, pos) else {
            break;
        };
        pos += 4;

        match prop_tag & PROP_TYPE_MASK {
            PT_BINARY => {
                // Two length-prefix words precede the data, matching
                // `handle_props`'s double `RT32` read before the payload.
                let Some(_count) = u32_le(payload, pos) else {
                    break;
                };
                pos += 4;
                let Some(num) = u32_le(payload, pos) else {
                    break;
                };
                pos += 4;
                let num = num as usize;
                let Some(data) = payload.get(pos..pos + num) else {
                    break;
                };
                if prop_tag == PR_RTF_COMPRESSED {
                    out.push(data.to_vec());
                }
                pos += padded(num);
            }
            PT_STRING8 => {
                let Some(_count) = u32_le(payload, pos) else {
                    break;
                };
                pos += 4;
                let Some(num) = u32_le(payload, pos) else {
                    break;
                };
                pos += 4;
                pos += padded(num as usize);
            }
            PT_UNICODE | PT_OBJECT => {}
            PT_I2 => pos += 2,
            PT_LONG | PT_R4 | PT_CURRENCY | PT_APPTIME | PT_ERROR | PT_BOOLEAN => pos += 4,
            PT_DOUBLE | PT_I8 | PT_SYSTIME => pos += 8,
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_prop(tag: u32, data: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&tag.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // count
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(data);
        let pad = padded(data.len()) - data.len();
        buf.extend(std::iter::repeat(0u8).take(pad));
        buf
    }

    #[test]
    fn extracts_rtf_compressed_binary_property() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend(binary_prop(PR_RTF_COMPRESSED, b"LZFUDATA"));
        let rtfs = extract_rtf_properties(&payload);
        assert_eq!(rtfs, vec![b"LZFUDATA".to_vec()]);
    }

    #[test]
    fn skips_unrelated_binary_properties() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u32.to_le_bytes());
        payload.extend(binary_prop(0x1234_0102, b"ignored!"));
        payload.extend(binary_prop(PR_RTF_COMPRESSED, b"keep-me"));
        let rtfs = extract_rtf_properties(&payload);
        assert_eq!(rtfs, vec![b"keep-me".to_vec()]);
    }

    #[test]
    fn skips_fixed_width_properties_without_consuming_rtf_data() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u32.to_le_bytes());
        payload.extend_from_slice(&0x0000_0003u32.to_le_bytes()); // PT_LONG
        payload.extend_from_slice(&42u32.to_le_bytes());
        payload.extend(binary_prop(PR_RTF_COMPRESSED, b"after-long"));
        let rtfs = extract_rtf_properties(&payload);
        assert_eq!(rtfs, vec![b"after-long".to_vec()]);
    }
}
