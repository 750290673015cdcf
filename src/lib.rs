#![deny(missing_debug_implementations)]

//! `mailrip` — extracts every attachment and embedded body from an
//! RFC 822 / MIME email (or a Unix-mbox concatenation of them), and
//! from the two binary containers commonly carried inside such mail:
//! Microsoft CFBF/OLE2 storage and TNEF (`application/ms-tnef`).
//!
//! The four "hard core" subsystems each live in their own module:
//! the MIME walker ([`walker`]), the content-transfer decoders
//! ([`decode`]), the CFBF/OLE2 parser ([`ole`]), and the TNEF walker
//! ([`tnef`]). Everything else — the byte source, the boundary and
//! name stacks, the header parser, the output sink, mbox splitting,
//! filename policy, configuration, and errors — supports those four.
//!
//! Entry points: [`walker::extract_message`] for a single message,
//! [`mbox::extract_mbox`] for an mbox-framed stream, and
//! [`extract_auto`] to dispatch between the two.

pub mod boundary;
pub mod config;
pub mod decode;
pub mod error;
pub mod filename;
pub mod header;
pub mod mbox;
pub mod namestack;
#[cfg(feature = "ole")]
pub mod ole;
pub mod sink;
pub mod source;
#[cfg(feature = "tnef")]
pub mod tnef;
pub mod walker;

pub use mailrip_types as types;

use mailrip_types::HeaderRecord;

use crate::config::Config;
use crate::sink::OutputSink;

/// Extract every attachment from `bytes`, auto-detecting mbox framing
///. Returns one [`HeaderRecord`]
/// per top-level message found.
pub fn extract_auto<S: OutputSink>(
    bytes: Vec<u8>,
    config: &Config,
    sink: &mut S,
) -> error::Result<Vec<HeaderRecord>> {
    if mbox::looks_like_mbox(&bytes) {
        mbox::extract_mbox(&bytes, config, sink)
    } else {
        Ok(vec![walker::extract_message(bytes, config, sink)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;

    #[test]
    fn extract_auto_dispatches_single_message() {
        let msg = b"Content-Type: text/plain\n\nhello\n".to_vec();
        let mut sink = MemorySink::new();
        let records = extract_auto(msg, &Config::default(), &mut sink).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn extract_auto_dispatches_mbox() {
        let msg = b"From a@b Mon Jan 1\nContent-Type: text/plain\n\nhello\n\nFrom c@d Tue Jan 2\nContent-Type: text/plain\n\nworld\n".to_vec();
        let mut sink = MemorySink::new();
        let records = extract_auto(msg, &Config::default(), &mut sink).unwrap();
        assert_eq!(records.len(), 2);
    }
}
