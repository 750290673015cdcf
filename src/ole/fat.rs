//! FAT (sector allocation table) construction: a two-stage load of the
//! 109 header-resident sector IDs, extended via DIF/XBAT sectors for
//! containers with more than 109 FAT sectors.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::cfbf::{Header, HEADER_FAT_SLOTS};

use super::sector_bytes;

fn i32_at(buf: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&buf[offset..])
}

/// Read every FAT sector named by `header` and flatten them into one
/// `sector_id -> next_sector_id` table.
///
/// Mirrors `OLE_load_FAT`: the header's 109 slots give the first FAT
/// sectors directly; any remaining FAT sectors are found via the DIF
/// (double-indirect FAT) chain starting at `header.dif_start`.
pub fn build_fat(buf: &[u8], header: &Header) -> Vec<i32> {
    let sector_size = header.sector_size();
    let entries_per_sector = sector_size / 4;
    let mut fat = Vec::new();

    let direct_count = (header.fat_sector_count as usize).min(HEADER_FAT_SLOTS);
    for &raw in header.header_fat.iter().take(direct_count) {
        append_fat_sector(buf, header, raw, entries_per_sector, &mut fat);
    }

    if header.dif_count > 0 && header.dif_start >= 0 {
        let mut current = header.dif_start;
        let mut remaining = header.dif_count;
        let mut visited = std::collections::HashSet::new();

        while remaining > 0 && current >= 0 && visited.insert(current) {
            let Some(dif) = sector_bytes(buf, header, current as u32) else {
                break;
            };
            let pointer_slot = entries_per_sector.saturating_sub(1);
            for i in 0..pointer_slot {
                let entry = i32_at(dif, i * 4);
                if entry < 0 {
                    break;
                }
                append_fat_sector(buf, header, entry, entries_per_sector, &mut fat);
            }
            current = i32_at(dif, pointer_slot * 4);
            remaining -= 1;
        }
    }

    fat
}

fn append_fat_sector(
    buf: &[u8],
    header: &Header,
    raw_sector: i32,
    entries_per_sector: usize,
    fat: &mut Vec<i32>,
) {
    if raw_sector < 0 {
        fat.extend(std::iter::repeat(-1).take(entries_per_sector));
        return;
    }
    match sector_bytes(buf, header, raw_sector as u32) {
        Some(data) => {
            for i in 0..entries_per_sector {
                fat.push(i32_at(data, i * 4));
            }
        }
        None => fat.extend(std::iter::repeat(-1).take(entries_per_sector)),
    }
}
