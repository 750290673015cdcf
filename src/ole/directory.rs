//! Directory entry parsing: a linear 128-byte-stride walk over the
//! directory stream.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::cfbf::{Colour, DirectoryEntry, EntryType};

const ENTRY_LEN: usize = 128;
const NAME_LEN: usize = 64;

fn u16_at(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..])
}

fn i32_at(buf: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&buf[offset..])
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..])
}

fn decode_name(raw: &[u8], byte_count: u16) -> String {
    // `byte_count` includes the trailing UTF-16 NUL: an 8-character
    // string with a trailing zero uses (8+1)*2 = 18 bytes.
    let char_count = (byte_count as usize / 2).saturating_sub(1).min(raw.len() / 2);
    let mut units = vec![0u16; char_count];
    LittleEndian::read_u16_into(&raw[..char_count * 2], &mut units);
    String::from_utf16_lossy(&units)
}

/// Walk a directory stream's bytes, producing every entry up to the
/// first unused slot or structurally invalid record.
pub fn parse_directory(buf: &[u8]) -> Vec<DirectoryEntry> {
    let mut entries = Vec::new();
    let mut index = 0u32;

    for chunk in buf.chunks(ENTRY_LEN) {
        if chunk.len() < ENTRY_LEN {
            break;
        }
        if chunk[0] < 1 {
            break;
        }

        let colour_byte = chunk[0x43];
        let Some(colour) = Colour::from_byte(colour_byte) else {
            break;
        };

        let entry_type_byte = chunk[0x42];
        let Some(entry_type) = EntryType::from_byte(entry_type_byte) else {
            break;
        };
        if entry_type == EntryType::Invalid {
            break;
        }

        let name_byte_count = u16_at(chunk, 0x40);
        let name = decode_name(&chunk[..NAME_LEN], name_byte_count);

        let mut class_guid = [0u8; 16];
        class_guid.copy_from_slice(&chunk[0x50..0x60]);

        entries.push(DirectoryEntry {
            index,
            name,
            entry_type,
            colour,
            left_sibling: i32_at(chunk, 0x44),
            right_sibling: i32_at(chunk, 0x48),
            child: i32_at(chunk, 0x4c),
            class_guid,
            start_sector: i32_at(chunk, 0x74),
            stream_size: u32_at(chunk, 0x78) as u64,
        });
        index += 1;
    }

    entries
}
