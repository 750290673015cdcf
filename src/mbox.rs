//! mbox splitting: recognizes a
//! Unix mbox concatenation of messages and invokes the MIME walker once
//! per message.

use mailrip_types::HeaderRecord;

use crate::config::Config;
use crate::sink::OutputSink;
use crate::walker::extract_message;

/// Is `bytes` an mbox concatenation rather than a single message?
/// Recognized by a `From ` line (case-sensitive, space
/// terminated) at start-of-file or immediately after a blank line.
pub fn looks_like_mbox(bytes: &[u8]) -> bool {
    first_from_line_offset(bytes, 0).is_some()
}

/// Find the offset of the next `From `-line boundary at or after
/// `from`, scanning only start-of-buffer and post-blank-line positions.
fn first_from_line_offset(bytes: &[u8], from: usize) -> Option<usize> {
    if bytes[from..].starts_with(b"From ") {
        return Some(from);
    }
    let mut i = from;
    let mut prev_blank_start = None;
    while i < bytes.len() {
        let line_start = i;
        let eol = bytes[i..].iter().position(|&b| b == b'\n').map(|p| i + p + 1);
        let line_end = eol.unwrap_or(bytes.len());
        let line = &bytes[line_start..line_end];
        let trimmed = strip_eol(line);

        if let Some(blank_at) = prev_blank_start {
            if line_start > blank_at && trimmed.starts_with(b"From ") {
                return Some(line_start);
            }
        }
        prev_blank_start = if trimmed.is_empty() { Some(line_start) } else { None };

        match eol {
            Some(next) => i = next,
            None => break,
        }
    }
    None
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

/// Split `bytes` into the byte ranges of each mbox message, in file
/// order. The first message starts at offset 0 even if it has no
/// leading `From ` line of its own — only later messages need one,
/// since they're recognized by a `From ` line after a blank line.
fn split_messages(bytes: &[u8]) -> Vec<&[u8]> {
    let mut starts = vec![0usize];
    let mut pos = 0usize;
    while let Some(next) = first_from_line_offset(bytes, pos + 1) {
        starts.push(next);
        pos = next;
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(bytes.len());
            &bytes[start..end]
        })
        .collect()
}

/// Process an mbox buffer, invoking the walker once per message and
/// staging each split message through the sink.
///
/// For an in-memory buffer there's nothing to actually stage to disk;
/// the staging handle is still opened and closed around each message so
/// sinks that track open/close pairs (and the `FilesystemSink`'s
/// on-disk mirror) behave identically to the non-seekable-stream path.
pub fn extract_mbox<S: OutputSink>(
    bytes: &[u8],
    config: &Config,
    sink: &mut S,
) -> crate::error::Result<Vec<HeaderRecord>> {
    let mut records = Vec::new();

    for (index, message) in split_messages(bytes).into_iter().enumerate() {
        let staging_name = format!("tmp.email{index}.mailpack");
        let handle = sink
            .create_staging(&staging_name)
            .map_err(|e| crate::error::ExtractError::SinkWrite(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        let record = extract_message(message.to_vec(), config, sink)?;
        records.push(record);

        sink.delete_staging(handle)
            .map_err(|e| crate::error::ExtractError::SinkWrite(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;

    #[test]
    fn recognizes_an_mbox_with_two_messages() {
        let input = b"From a@b Mon Jan 1\nSubject: one\n\nbody1\n\nFrom c@d Tue Jan 2\nSubject: two\n\nbody2\n";
        assert!(looks_like_mbox(input));
        let msgs = split_messages(input);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].starts_with(b"From a@b"));
        assert!(msgs[1].starts_with(b"From c@d"));
    }

    #[test]
    fn a_single_message_is_not_mbox() {
        let input = b"Subject: hi\n\nbody";
        assert!(!looks_like_mbox(input));
        assert_eq!(split_messages(input).len(), 1);
    }

    #[test]
    fn from_line_not_after_blank_line_does_not_split() {
        let input = b"Subject: hi\nFrom inline text\n\nbody";
        assert!(!looks_like_mbox(input));
    }

    #[test]
    fn extract_mbox_invokes_walker_per_message_and_stages_each() {
        let input = b"From a@b Mon Jan 1\nSubject: one\nContent-Type: text/plain\n\nbody1\n\nFrom c@d Tue Jan 2\nSubject: two\nContent-Type: text/plain\n\nbody2\n";
        let mut sink = MemorySink::new();
        let config = Config::default();
        let records = extract_mbox(input, &config, &mut sink).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject.as_deref(), Some("one"));
        assert_eq!(records[1].subject.as_deref(), Some("two"));
    }
}
