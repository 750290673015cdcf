//! Filename and path policy.

use crate::config::{Config, RenameMethod};
use mailrip_types::MimePart;

/// Restrict a filename to printable ASCII, mapping anything outside
/// `[0x20, 0x7E]` — and `/`, `\` — to `_`, unless `mac_resource` is set,
/// in which case `/` is preserved.
pub fn sanitize(raw: &str, mac_resource: bool) -> String {
    raw.chars()
        .map(|c| {
            if !c.is_ascii() || (c as u32) < 0x20 || (c as u32) > 0x7E {
                '_'
            } else if c == '\\' {
                '_'
            } else if c == '/' {
                if mac_resource {
                    '/'
                } else {
                    '_'
                }
            } else {
                c
            }
        })
        .collect()
}

/// Choose the default synthetic name for a part with no usable
/// `filename`/`name`.
pub fn default_name(config: &Config, part: &MimePart, index: u32) -> String {
    let prefix = if config.name_by_type {
        part.content_type
            .as_str()
            .replace('/', "-")
            .replace('\\', "-")
    } else {
        config.default_name_prefix.clone()
    };
    format!("{prefix}{index}")
}

/// Apply one of the six rename schemes on a collision. `random` is a process-local value drawn once per
/// collision by the caller; it carries no cryptographic requirement.
pub fn rename_for_collision(name: &str, attempt: u32, method: RenameMethod, random: u32) -> String {
    let (base, ext) = split_ext(name);
    match method {
        RenameMethod::PrefixCounter => format!("{attempt}_{name}"),
        RenameMethod::PrefixCounterRandom => format!("{attempt}_{random:08x}_{name}"),
        RenameMethod::InfixCounter => match ext {
            Some(ext) => format!("{base}_{attempt}.{ext}"),
            None => format!("{base}_{attempt}"),
        },
        RenameMethod::InfixCounterRandom => match ext {
            Some(ext) => format!("{base}_{attempt}_{random:08x}.{ext}"),
            None => format!("{base}_{attempt}_{random:08x}"),
        },
        RenameMethod::PostfixCounter => format!("{name}_{attempt}"),
        RenameMethod::PostfixCounterRandom => format!("{name}_{attempt}_{random:08x}"),
    }
}

fn split_ext(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// A trivial process-local PRNG (xorshift) so the random component of a
/// rename scheme needs no external crate or cryptographic guarantee
///.
#[derive(Debug)]
pub struct WeakRandom {
    state: u64,
}

impl WeakRandom {
    pub fn new(seed: u64) -> Self {
        WeakRandom {
            state: seed | 1,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 16) as u32
    }
}
