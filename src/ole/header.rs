//! CFBF header parsing: the fixed 512-byte record at the start of
//! every compound file, validated and decoded field by field.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::cfbf::{Header, HEADER_FAT_SLOTS, HEADER_LEN, SIGNATURE_CFBF, SIGNATURE_CFBF_ALT};
use mailrip_types::ErrorKind;

fn u16_at(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..])
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..])
}

fn i32_at(buf: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&buf[offset..])
}

/// Parse the fixed 512-byte CFBF header. Returns `None` if `bytes` is
/// too short or doesn't carry a recognized signature.
pub fn parse_header(bytes: &[u8]) -> Option<Header> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    if bytes[..8] != SIGNATURE_CFBF[..] && bytes[..8] != SIGNATURE_CFBF_ALT[..] {
        return None;
    }

    let sector_shift = u16_at(bytes, 0x1e);
    let mini_sector_shift = u16_at(bytes, 0x20);
    let fat_sector_count = u32_at(bytes, 0x2c);
    let first_directory_sector = i32_at(bytes, 0x30);
    let mini_cutoff = u32_at(bytes, 0x38);
    let mini_fat_start = i32_at(bytes, 0x3c);
    let mini_fat_count = u32_at(bytes, 0x40);
    let dif_start = i32_at(bytes, 0x44);
    let dif_count = u32_at(bytes, 0x48);

    let mut header_fat = [-1i32; HEADER_FAT_SLOTS];
    for (i, slot) in header_fat.iter_mut().enumerate() {
        *slot = i32_at(bytes, 0x4c + i * 4);
    }

    Some(Header {
        sector_shift,
        mini_sector_shift,
        fat_sector_count,
        first_directory_sector,
        mini_cutoff,
        mini_fat_start,
        mini_fat_count,
        dif_start,
        dif_count,
        header_fat,
    })
}

/// Degree-of-insanity check: any positive result means the container
/// should be rejected rather than walked.
pub fn sanity_check(header: &Header, file_size: u64) -> Result<(), ErrorKind> {
    let sector_size = header.sector_size().max(1) as u64;
    let max_sectors = file_size / sector_size;

    let mut insanity = 0u32;
    if header.sector_shift > 20 {
        insanity += 1;
    }
    if header.mini_sector_shift > 10 {
        insanity += 1;
    }
    if (header.fat_sector_count as u64) > max_sectors {
        insanity += 1;
    }
    if header.first_directory_sector >= 0 && (header.first_directory_sector as u64) > max_sectors {
        insanity += 1;
    }

    if insanity > 0 {
        Err(ErrorKind::InsaneCfbfHeader)
    } else {
        Ok(())
    }
}
