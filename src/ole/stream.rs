//! Sector-chain and mini-sector-chain traversal. Cycle detection uses a
//! `HashSet` of visited sector indices: a chain must not revisit a sector.

use std::collections::HashSet;

use mailrip_types::cfbf::{Header, SECTOR_END_OF_CHAIN, SECTOR_FREE};

use super::sector_bytes;

/// Result of following a sector chain: the concatenated bytes, and
/// whether the walk stopped early because it revisited a sector
/// (`cycle_detected`, spec §4.5/§7 — the chain is truncated at that
/// point rather than looping forever).
pub struct ChainResult {
    pub data: Vec<u8>,
    pub cycle_detected: bool,
}

/// Follow a chain through the main FAT, concatenating each sector's raw
/// bytes in order. Stops at a terminal sector ID, an out-of-range
/// index, or a revisited sector (cycle).
pub fn load_chain(buf: &[u8], header: &Header, fat: &[i32], start: i32) -> ChainResult {
    if start < 0 {
        return ChainResult { data: Vec::new(), cycle_detected: false };
    }
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut current = start;
    let mut cycle_detected = false;

    loop {
        if current < 0 || !visited.insert(current) {
            cycle_detected = current >= 0;
            break;
        }
        let Some(data) = sector_bytes(buf, header, current as u32) else {
            break;
        };
        out.extend_from_slice(data);

        let Some(&next) = fat.get(current as usize) else {
            break;
        };
        if next == current {
            cycle_detected = true;
            break;
        }
        current = next;
        if current == SECTOR_FREE || current == SECTOR_END_OF_CHAIN || current < -1 {
            break;
        }
    }

    ChainResult { data: out, cycle_detected }
}

/// Follow a chain through the miniFAT, concatenating mini-sectors read
/// out of the already-loaded `ministream` pool.
pub fn load_minichain(header: &Header, minifat: &[i32], ministream: &[u8], start: i32) -> ChainResult {
    if start < 0 {
        return ChainResult { data: Vec::new(), cycle_detected: false };
    }
    let mini_size = header.mini_sector_size();
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut current = start;
    let mut cycle_detected = false;

    loop {
        if current < 0 || !visited.insert(current) {
            cycle_detected = current >= 0;
            break;
        }
        let offset = current as usize * mini_size;
        let Some(chunk) = ministream.get(offset..offset + mini_size) else {
            break;
        };
        out.extend_from_slice(chunk);

        let Some(&next) = minifat.get(current as usize) else {
            break;
        };
        if next == current {
            cycle_detected = true;
            break;
        }
        current = next;
        if current == SECTOR_FREE || current == SECTOR_END_OF_CHAIN || current < -1 {
            break;
        }
    }

    ChainResult { data: out, cycle_detected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailrip_types::cfbf::HEADER_FAT_SLOTS;

    fn header() -> Header {
        Header {
            sector_shift: 9,
            mini_sector_shift: 6,
            fat_sector_count: 1,
            first_directory_sector: -1,
            mini_cutoff: 4096,
            mini_fat_start: -2,
            mini_fat_count: 0,
            dif_start: -2,
            dif_count: 0,
            header_fat: [-1i32; HEADER_FAT_SLOTS],
        }
    }

    #[test]
    fn loads_a_two_sector_chain() {
        let h = header();
        let mut buf = vec![0u8; 512 + 512 * 2];
        buf[512..512 + 4].copy_from_slice(b"AAAA");
        buf[512 + 512..512 + 512 + 4].copy_from_slice(b"BBBB");
        let fat = vec![1, -2];
        let result = load_chain(&buf, &h, &fat, 0);
        assert_eq!(result.data.len(), 1024);
        assert_eq!(&result.data[..4], b"AAAA");
        assert_eq!(&result.data[512..516], b"BBBB");
        assert!(!result.cycle_detected);
    }

    #[test]
    fn stops_on_self_referential_cycle() {
        let h = header();
        let buf = vec![0u8; 1024];
        let fat = vec![0, -2];
        let result = load_chain(&buf, &h, &fat, 0);
        assert_eq!(result.data.len(), 512);
        assert!(result.cycle_detected);
    }
}
