//! TNEF (`application/ms-tnef`) extraction:
//! a flat attribute stream carrying attachment title/data pairs and,
//! inside `attMAPIProps`, a `PR_RTF_COMPRESSED` binary body.

mod attributes;
mod mapi;

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::tnef::{AttributeTag, SIGNATURE};

fn signature_matches(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && LittleEndian::read_u32(bytes) == SIGNATURE
}

fn decode_title(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end]).into_owned()
}

/// Extract every recoverable attachment from a TNEF stream's raw bytes:
/// `attAttachTitle`/`attAttachData` pairs, plus any `PR_RTF_COMPRESSED`
/// MAPI property found under `attMAPIProps`. Returns an empty vector for
/// anything lacking the TNEF signature.
pub fn extract(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    if !signature_matches(bytes) {
        return out;
    }
    // Skip the 4-byte signature and the 2-byte attach key.
    let Some(body) = bytes.get(6..) else {
        return out;
    };

    let attrs = attributes::parse_attributes(body);

    let mut pending_title: Option<String> = None;
    let mut pending_data: Option<Vec<u8>> = None;
    let mut rtf_counter = 0u32;

    for attr in &attrs {
        match attr.tag {
            AttributeTag::AttachRenddata => {
                pending_title = None;
                pending_data = None;
            }
            AttributeTag::AttachTitle => {
                let title = decode_title(&attr.payload);
                if let Some(data) = pending_data.take() {
                    out.push((title, data));
                    pending_title = None;
                } else {
                    pending_title = Some(title);
                }
            }
            AttributeTag::AttachData => {
                if attr.payload.is_empty() {
                    continue;
                }
                if let Some(title) = pending_title.take() {
                    out.push((title, attr.payload.clone()));
                } else {
                    pending_data = Some(attr.payload.clone());
                }
            }
            AttributeTag::MapiProps => {
                for rtf in mapi::extract_rtf_properties(&attr.payload) {
                    out.push((format!("{rtf_counter}.rtf"), rtf));
                    rtf_counter += 1;
                }
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute_bytes(raw_tag: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(2u8); // level: attachment
        buf.extend_from_slice(&raw_tag.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf
    }

    fn stream_with(attrs: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // attach key
        buf.extend_from_slice(attrs);
        buf
    }

    #[test]
    fn pairs_title_then_data() {
        let mut attrs = Vec::new();
        attrs.extend(attribute_bytes(0x0001_8010, b"photo.jpg\0"));
        attrs.extend(attribute_bytes(0x0006_800F, b"JFIFDATA"));
        let stream = stream_with(&attrs);
        let out = extract(&stream);
        assert_eq!(out, vec![("photo.jpg".to_string(), b"JFIFDATA".to_vec())]);
    }

    #[test]
    fn pairs_data_then_title() {
        let mut attrs = Vec::new();
        attrs.extend(attribute_bytes(0x0006_800F, b"JFIFDATA"));
        attrs.extend(attribute_bytes(0x0001_8010, b"photo.jpg\0"));
        let stream = stream_with(&attrs);
        let out = extract(&stream);
        assert_eq!(out, vec![("photo.jpg".to_string(), b"JFIFDATA".to_vec())]);
    }

    #[test]
    fn rejects_a_bad_signature() {
        let mut stream = stream_with(&[]);
        stream[0] = 0;
        assert!(extract(&stream).is_empty());
    }

    #[test]
    fn extracts_rtf_compressed_mapi_property() {
        let mut props = Vec::new();
        props.extend_from_slice(&1u32.to_le_bytes());
        props.extend_from_slice(&mailrip_types::tnef::PR_RTF_COMPRESSED.to_le_bytes());
        props.extend_from_slice(&1u32.to_le_bytes());
        props.extend_from_slice(&4u32.to_le_bytes());
        props.extend_from_slice(b"rtfd");
        let attrs = attribute_bytes(0x0003_9003, &props);
        let stream = stream_with(&attrs);
        let out = extract(&stream);
        assert_eq!(out, vec![("0.rtf".to_string(), b"rtfd".to_vec())]);
    }
}
