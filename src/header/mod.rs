//! Header parsing orchestration: turns a scanned
//! [`parser::HeaderBlock`] into a populated [`MimePart`] and folds the
//! top-level message headers into a [`HeaderRecord`].

pub mod comments;
pub mod params;
pub mod parser;
pub mod rfc2047;

use mailrip_types::{
    ContentDisposition, ContentTransferEncoding, ContentType, Defect, HeaderRecord, MimePart,
};

use crate::source::ByteSource;

use parser::{scan_header_block, split_value_and_params, HeaderBlock};

/// Parse the header block for one MIME part, returning the populated
/// part record. `depth` is the recursion depth the walker is about to
/// enter.
pub fn parse_part_headers(
    source: &mut ByteSource,
    header_longsearch: bool,
    depth: u32,
) -> (MimePart, HeaderBlock) {
    let block = scan_header_block(source, header_longsearch);
    let mut part = MimePart::new(depth);
    part.defects = block.defects.clone();

    let mut mac_type_seen = false;
    let mut mac_creator_seen = false;

    for header in &block.raw {
        let lower = header.name.to_ascii_lowercase();
        match lower.as_str() {
            "content-type" => {
                let sv = split_value_and_params(&header.value, &mut part.defects);
                part.content_type = ContentType::parse(&sv.primary);
                if let Some(charset) = sv.params.get("charset") {
                    part.charset = Some(charset.clone());
                }
                if let Some(boundary) = sv.params.get("boundary") {
                    part.boundary = Some(boundary.clone());
                    part.boundary_secondary = sv.boundary_secondary.clone();
                }
                if let Some(name) = sv.params.get("name") {
                    part.name = Some(name.clone());
                }
                if sv.params.contains_key("x-mac-type") {
                    mac_type_seen = true;
                }
                if sv.params.contains_key("x-mac-creator") {
                    mac_creator_seen = true;
                }
            }
            "content-transfer-encoding" => {
                part.transfer_encoding = ContentTransferEncoding::parse(&header.value);
            }
            "content-disposition" => {
                let sv = split_value_and_params(&header.value, &mut part.defects);
                part.disposition = ContentDisposition::parse(&sv.primary);
                if let Some(filename) = sv.params.get("filename") {
                    if part.filename.is_some() {
                        part.defects.record(Defect::MultipleFilenames);
                    }
                    part.filename = Some(filename.clone());
                }
            }
            "content-location" => {
                part.content_location = Some(header.value.trim().to_string());
            }
            _ => {}
        }
    }

    part.transfer_encoding = part
        .transfer_encoding
        .resolve_implied(part.content_type.is_octet_stream());
    part.mac_resource = mac_type_seen && mac_creator_seen;

    if part.declared_names().len() > 1 {
        part.defects.record(Defect::MultipleNames);
    }

    (part, block)
}

/// Fold the recognized outer-message headers into the running
/// [`HeaderRecord`].
pub fn apply_message_headers(record: &mut HeaderRecord, block: &HeaderBlock) {
    record.defects.merge(&block.defects);
    for header in &block.raw {
        match header.name.to_ascii_lowercase().as_str() {
            "subject" => record.set_subject_if_unset(parser::decode_display_value(&header.value)),
            "from" if record.from.is_none() => {
                record.from = Some(parser::decode_display_value(&header.value))
            }
            "to" if record.to.is_none() => {
                record.to = Some(parser::decode_display_value(&header.value))
            }
            "date" if record.date.is_none() => record.date = Some(header.value.clone()),
            "message-id" if record.message_id.is_none() => {
                record.message_id = Some(header.value.clone())
            }
            "received" => record.set_first_received_if_unset(header.value.clone()),
            _ => {}
        }
    }
}
