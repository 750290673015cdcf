//! MiniFAT construction: load the chain starting at
//! `header.mini_fat_start` and treat the loaded bytes as a flat
//! `next_sector` table, exactly like the main FAT but addressed in
//! mini-sector units.

use byteorder::{ByteOrder, LittleEndian};
use mailrip_types::cfbf::Header;

use super::stream::load_chain;

/// Load the miniFAT sector chain and flatten it into a
/// `mini_sector -> next_mini_sector` table, alongside whether the chain
/// that backs it had to be truncated on a cycle (spec §4.5/§7
/// `cycle_detected`).
pub fn build_minifat(buf: &[u8], header: &Header, fat: &[i32]) -> (Vec<i32>, bool) {
    let chain = load_chain(buf, header, fat, header.mini_fat_start);
    let table = chain.data.chunks_exact(4).map(LittleEndian::read_i32).collect();
    (table, chain.cycle_detected)
}
