//! `\x01Ole10Native` payload extraction: two distinct payload shapes
//! depending on whether the leading size field accounts for (nearly)
//! the whole stream.

use byteorder::{ByteOrder, LittleEndian};

const PNG_SIG: [u8; 3] = [0x89, 0x50, 0x4e];
const JPEG_SIG: [u8; 3] = [0xff, 0xd8, 0xff];

fn u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset + 2).map(LittleEndian::read_u16)
}

fn u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4).map(LittleEndian::read_u32)
}

fn read_cstring(buf: &[u8], offset: usize) -> Option<(String, usize)> {
    let rest = buf.get(offset..)?;
    let len = rest.iter().position(|&b| b == 0)?;
    let text = String::from_utf8_lossy(&rest[..len]).into_owned();
    Some((text, offset + len + 1))
}

/// Forward-scan for a PNG or JPEG signature, comparing only the leading
/// 3 bytes of each candidate — the PNG signature is 4 bytes long but
/// only 3 are checked, matching observed OLEPICTURE producers.
fn search_for_file_signature(block: &[u8]) -> Option<usize> {
    if block.len() <= 4 {
        return None;
    }
    let usable = block.len() - 4;
    for offset in 0..usable {
        let window = &block[offset..offset + 3];
        if window == PNG_SIG || window == JPEG_SIG {
            return Some(offset);
        }
    }
    None
}

/// One extracted OLE10Native payload.
pub struct NativePayload {
    pub name: String,
    pub data: Vec<u8>,
}

/// Decode an OLE10Native stream's raw bytes into its embedded
/// attachment, dispatching on which of the two payload shapes it is.
pub fn decode_attachment(stream: &[u8]) -> Option<NativePayload> {
    let stream_size = stream.len();
    let attach_size_1 = u32_le(stream, 0)? as i64;
    let attach_start_offset = stream_size as i64 - attach_size_1;

    if attach_start_offset < 4 {
        let sp = &stream[4..];
        let cbheader = u16_le(sp, 0)? as usize;
        let mfpmm = u16_le(sp, 2)?;

        let header_relative_start = cbheader.checked_sub(4)?;
        let mut data_start = 4 + header_relative_start;

        if mfpmm == 100 {
            let mut search_size = 500usize;
            if stream_size < search_size + 68 {
                search_size = stream_size.saturating_sub(69);
            }
            if let Some(window) = stream.get(data_start..) {
                let window = &window[..window.len().min(search_size)];
                if let Some(image_offset) = search_for_file_signature(window) {
                    data_start += image_offset;
                }
            }
        }

        let attach_size = attach_size_1.max(0) as usize;
        let data = stream
            .get(data_start..)
            .map(|rest| rest[..rest.len().min(attach_size)].to_vec())
            .unwrap_or_default();

        Some(NativePayload {
            name: format!("image-{attach_size_1}"),
            data,
        })
    } else {
        let mut sp = 4usize;
        sp = sp.checked_add(2)?; // two unknown bytes (an unused 16-bit flags field)
        let (attach_name, next) = read_cstring(stream, sp)?;
        sp = next;
        let (_fname_1, next) = read_cstring(stream, sp)?;
        sp = next;
        sp = sp.checked_add(8)?; // unknown fixed-size segment
        let (_fname_2, next) = read_cstring(stream, sp)?;
        sp = next;
        let attach_size = u32_le(stream, sp)? as usize;
        sp += 4;
        let attach_size = attach_size.min(stream_size);

        let data = stream
            .get(sp..)
            .map(|rest| rest[..rest.len().min(attach_size)].to_vec())
            .unwrap_or_default();

        Some(NativePayload {
            name: attach_name,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_stream(name: &str, path: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes()); // attach_size_1, irrelevant to this branch
        buf.extend_from_slice(&[0u8; 2]);
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(path.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(path.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn decodes_package_variant() {
        let stream = package_stream("report.pdf", "C:\\tmp\\report.pdf", b"PDFDATA");
        let payload = decode_attachment(&stream).unwrap();
        assert_eq!(payload.name, "report.pdf");
        assert_eq!(payload.data, b"PDFDATA");
    }

    #[test]
    fn decodes_escher_image_variant_with_signature_search() {
        let cbheader = 16u16; // sp-relative header length; data starts at sp+cbheader-4
        let mut payload = vec![0u8; 5];
        payload.extend_from_slice(&PNG_SIG);
        payload.push(0x0d);
        payload.extend_from_slice(b"therest");

        let mut tail = Vec::new();
        tail.extend_from_slice(&cbheader.to_le_bytes());
        tail.extend_from_slice(&100u16.to_le_bytes()); // mfp.mm == Escher
        tail.extend_from_slice(&0u16.to_le_bytes());
        tail.extend_from_slice(&0u16.to_le_bytes());
        tail.extend_from_slice(&0u16.to_le_bytes());
        tail.extend_from_slice(&0u16.to_le_bytes());
        tail.extend_from_slice(&payload);

        // attach_start_offset = stream_size - attach_size_1 must be < 4;
        // pick attach_size_1 equal to the whole stream length.
        let stream_size = 4 + tail.len();
        let attach_size_1 = stream_size as u32;

        let mut stream = Vec::new();
        stream.extend_from_slice(&attach_size_1.to_le_bytes());
        stream.extend_from_slice(&tail);

        let decoded = decode_attachment(&stream).unwrap();
        assert_eq!(decoded.name, format!("image-{attach_size_1}"));
        assert!(decoded.data.starts_with(&PNG_SIG));
    }
}
