//! In-memory sink.
//! Used throughout the test suite and by any caller that wants the
//! decoded bytes without touching the filesystem.

use std::collections::HashMap;

use mailrip_types::{DefectHistogram, ErrorHistogram};
use thiserror::Error;

use super::{OutputSink, SinkHandle};

#[derive(Debug, Error)]
#[error("memory sink error: {0}")]
pub struct MemorySinkError(pub String);

#[derive(Clone, Debug, Default)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
    pub aliases: Vec<String>,
}

/// Buffers every `(logical_name, bytes)` tuple handed to it. When
/// `list_only` is set, bytes are discarded immediately after their
/// length is recorded.
#[derive(Debug, Default)]
pub struct MemorySink {
    attachments: Vec<Attachment>,
    by_handle: HashMap<u64, usize>,
    next_handle: u64,
    pub list_only: bool,
    pub defects: Vec<DefectHistogram>,
    pub errors: Vec<ErrorHistogram>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_only() -> Self {
        MemorySink {
            list_only: true,
            ..Default::default()
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn names(&self) -> Vec<&str> {
        self.attachments.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    /// Drop every buffered attachment whose name is exactly `prefix`
    /// followed by one or more ASCII digits,
    /// mirroring `FilesystemSink::remove_nameless`.
    pub fn remove_nameless(&mut self, prefix: &str) {
        self.attachments.retain(|a| {
            let Some(digits) = a.name.strip_prefix(prefix) else {
                return true;
            };
            digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
        });
    }
}

impl OutputSink for MemorySink {
    type Error = MemorySinkError;

    fn create(&mut self, logical_name: &str) -> Result<SinkHandle, Self::Error> {
        let index = self.attachments.len();
        self.attachments.push(Attachment {
            name: logical_name.to_string(),
            bytes: Vec::new(),
            aliases: Vec::new(),
        });
        let handle = self.next_handle;
        self.next_handle += 1;
        self.by_handle.insert(handle, index);
        Ok(SinkHandle(handle))
    }

    fn write(&mut self, handle: SinkHandle, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.list_only {
            return Ok(());
        }
        let index = *self
            .by_handle
            .get(&handle.0)
            .ok_or_else(|| MemorySinkError("unknown handle".into()))?;
        self.attachments[index].bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self, _handle: SinkHandle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn rename_collision(&mut self, logical_name: &str, attempt: u32) -> String {
        format!("{logical_name}_{attempt}")
    }

    fn link(&mut self, existing: SinkHandle, alias: &str) -> Result<(), Self::Error> {
        let index = *self
            .by_handle
            .get(&existing.0)
            .ok_or_else(|| MemorySinkError("unknown handle".into()))?;
        self.attachments[index].aliases.push(alias.to_string());
        Ok(())
    }

    fn report_defects(&mut self, defects: &DefectHistogram) {
        self.defects.push(defects.clone());
    }

    fn report_errors(&mut self, errors: &ErrorHistogram) {
        self.errors.push(errors.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read_back_roundtrips() {
        let mut sink = MemorySink::new();
        let h = sink.create("a.txt").unwrap();
        sink.write(h, b"hello").unwrap();
        sink.close(h).unwrap();
        assert_eq!(sink.find("a.txt").unwrap().bytes, b"hello");
    }

    #[test]
    fn list_only_discards_bytes() {
        let mut sink = MemorySink::list_only();
        let h = sink.create("a.txt").unwrap();
        sink.write(h, b"hello").unwrap();
        assert!(sink.find("a.txt").unwrap().bytes.is_empty());
    }

    #[test]
    fn remove_nameless_drops_only_synthesized_names() {
        let mut sink = MemorySink::new();
        let h0 = sink.create("textfile0").unwrap();
        sink.write(h0, b"a").unwrap();
        let h1 = sink.create("report.pdf").unwrap();
        sink.write(h1, b"b").unwrap();
        sink.remove_nameless("textfile");
        assert!(sink.find("textfile0").is_none());
        assert!(sink.find("report.pdf").is_some());
    }

    #[test]
    fn link_records_alias() {
        let mut sink = MemorySink::new();
        let h = sink.create("a.txt").unwrap();
        sink.link(h, "b.txt").unwrap();
        assert_eq!(sink.find("a.txt").unwrap().aliases, vec!["b.txt"]);
    }
}
