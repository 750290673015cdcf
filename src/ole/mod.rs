//! CFBF/OLE2 container extraction:
//! unwraps the `\x01Ole10Native` stream embedded in Word/Outlook
//! "Package" attachments.

mod directory;
mod fat;
mod header;
mod minifat;
mod ole10native;
mod stream;

use mailrip_types::cfbf::{EntryType, Header};
use mailrip_types::{ErrorHistogram, ErrorKind};

use crate::config::Config;

fn sector_bytes<'a>(buf: &'a [u8], header: &Header, sector: u32) -> Option<&'a [u8]> {
    let offset = header.sector_offset(sector) as usize;
    let size = header.sector_size();
    buf.get(offset..offset.checked_add(size)?)
}

fn note_cycle(errors: &mut ErrorHistogram, cycle_detected: bool) {
    if cycle_detected {
        errors.record(ErrorKind::CycleDetected);
    }
}

/// Extract every recognized attachment payload from a CFBF container's
/// raw bytes. Returns an empty vector for anything that fails the
/// header sanity check rather than erroring — a malformed CFBF stream
/// is simply not unwrapped further. Every FAT/miniFAT chain that had to
/// be truncated on a cycle (spec §4.5/§7) registers `cycle_detected`
/// into `errors`.
pub fn extract(bytes: &[u8], config: &Config, errors: &mut ErrorHistogram) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();

    let Some(header) = header::parse_header(bytes) else {
        return out;
    };
    if header::sanity_check(&header, bytes.len() as u64).is_err() {
        return out;
    }

    let fat = fat::build_fat(bytes, &header);
    let directory_chain = stream::load_chain(bytes, &header, &fat, header.first_directory_sector);
    note_cycle(errors, directory_chain.cycle_detected);
    let entries = directory::parse_directory(&directory_chain.data);

    let Some(root) = entries.iter().find(|e| e.entry_type == EntryType::Root) else {
        return out;
    };
    let ministream_chain = stream::load_chain(bytes, &header, &fat, root.start_sector);
    note_cycle(errors, ministream_chain.cycle_detected);
    let ministream = ministream_chain.data;
    let (minifat, minifat_cycle) = minifat::build_minifat(bytes, &header, &fat);
    note_cycle(errors, minifat_cycle);

    for entry in entries.iter().filter(|e| e.entry_type == EntryType::Stream) {
        let chain = if entry.stream_size >= header.mini_cutoff as u64 {
            stream::load_chain(bytes, &header, &fat, entry.start_sector)
        } else {
            stream::load_minichain(&header, &minifat, &ministream, entry.start_sector)
        };
        note_cycle(errors, chain.cycle_detected);
        let mut data = chain.data;
        data.truncate(entry.stream_size as usize);

        if entry.is_ole10_native() {
            if let Some(payload) = ole10native::decode_attachment(&data) {
                out.push((payload.name, payload.data));
            }
        } else if config.emit_unknown_ole_streams {
            out.push((format!("ole-stream.{}", entry.start_sector), data));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailrip_types::cfbf::{HEADER_LEN, SIGNATURE_CFBF};

    /// Build a minimal, hand-laid-out single-FAT-sector CFBF file
    /// containing one root entry and one `\x01Ole10Native` stream, whose
    /// payload is the "Package" variant.
    fn build_container() -> Vec<u8> {
        let sector_size = 512usize;
        // Sector layout: 0 = FAT, 1 = directory, 2 = Ole10Native stream data.
        let native_payload = {
            let mut buf = Vec::new();
            buf.extend_from_slice(&0u32.to_le_bytes()); // attach_size_1 (unused in Package branch math here)
            buf.extend_from_slice(&[0u8; 2]);
            buf.extend_from_slice(b"report.pdf");
            buf.push(0);
            buf.extend_from_slice(b"C:\\tmp\\report.pdf");
            buf.push(0);
            buf.extend_from_slice(&[0u8; 8]);
            buf.extend_from_slice(b"C:\\tmp\\report.pdf");
            buf.push(0);
            buf.extend_from_slice(&7u32.to_le_bytes());
            buf.extend_from_slice(b"PDFDATA");
            buf
        };

        let mut file = vec![0u8; HEADER_LEN];
        file[..8].copy_from_slice(&SIGNATURE_CFBF);
        file[0x1e..0x20].copy_from_slice(&9u16.to_le_bytes()); // sector_shift -> 512
        file[0x20..0x22].copy_from_slice(&6u16.to_le_bytes()); // mini_sector_shift -> 64
        file[0x2c..0x30].copy_from_slice(&1u32.to_le_bytes()); // fat_sector_count
        file[0x30..0x34].copy_from_slice(&1i32.to_le_bytes()); // directory start sector
        file[0x38..0x3c].copy_from_slice(&0u32.to_le_bytes()); // mini_cutoff: force the main-FAT path
        file[0x3c..0x40].copy_from_slice(&(-2i32).to_le_bytes()); // mini_fat_start = none
        file[0x40..0x44].copy_from_slice(&0u32.to_le_bytes());
        file[0x44..0x48].copy_from_slice(&(-2i32).to_le_bytes()); // dif_start = none
        file[0x48..0x4c].copy_from_slice(&0u32.to_le_bytes());
        file[0x4c..0x50].copy_from_slice(&0i32.to_le_bytes()); // header FAT slot 0 -> sector 0

        // Sector 0: the FAT itself. sector 0 (FAT sector) -> FATSECT(-3),
        // sector 1 (directory) -> END_OF_CHAIN, sector 2 (stream) -> END_OF_CHAIN.
        let mut sector0 = vec![0u8; sector_size];
        sector0[0..4].copy_from_slice(&(-3i32).to_le_bytes());
        sector0[4..8].copy_from_slice(&(-2i32).to_le_bytes());
        sector0[8..12].copy_from_slice(&(-2i32).to_le_bytes());

        // Sector 1: directory stream, two 128-byte entries (root, stream).
        let mut sector1 = vec![0u8; sector_size];
        write_entry(&mut sector1[0..128], "Root Entry", 5, 1, -1, 0);
        write_entry(
            &mut sector1[128..256],
            "\u{1}Ole10Native",
            2,
            1,
            2,
            native_payload.len() as u32,
        );

        // Sector 2: the stream payload itself.
        let mut sector2 = vec![0u8; sector_size];
        sector2[..native_payload.len()].copy_from_slice(&native_payload);

        file.extend_from_slice(&sector0);
        file.extend_from_slice(&sector1);
        file.extend_from_slice(&sector2);
        file
    }

    fn write_entry(buf: &mut [u8], name: &str, entry_type: u8, colour: u8, start_sector: i32, size: u32) {
        let utf16: Vec<u16> = name.encode_utf16().collect();
        for (i, unit) in utf16.iter().enumerate() {
            buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let byte_count = ((utf16.len() + 1) * 2) as u16;
        buf[0x40..0x42].copy_from_slice(&byte_count.to_le_bytes());
        buf[0x42] = entry_type;
        buf[0x43] = colour;
        buf[0x44..0x48].copy_from_slice(&(-1i32).to_le_bytes());
        buf[0x48..0x4c].copy_from_slice(&(-1i32).to_le_bytes());
        buf[0x4c..0x50].copy_from_slice(&(-1i32).to_le_bytes());
        buf[0x74..0x78].copy_from_slice(&start_sector.to_le_bytes());
        buf[0x78..0x7c].copy_from_slice(&size.to_le_bytes());
    }

    #[test]
    fn extracts_ole10native_package_payload() {
        let file = build_container();
        let config = Config::default();
        let mut errors = ErrorHistogram::new();
        let results = extract(&file, &config, &mut errors);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "report.pdf");
        assert_eq!(results[0].1, b"PDFDATA");
        assert!(errors.is_empty());
    }

    #[test]
    fn self_referential_directory_chain_registers_cycle_detected() {
        let mut file = build_container();
        // Sector 0 (the FAT): point the directory sector (1) at itself.
        file[HEADER_LEN + 4..HEADER_LEN + 8].copy_from_slice(&1i32.to_le_bytes());
        let config = Config::default();
        let mut errors = ErrorHistogram::new();
        let _ = extract(&file, &config, &mut errors);
        assert_eq!(errors.count(ErrorKind::CycleDetected), 1);
    }
}
