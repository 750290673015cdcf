//! Filesystem sink.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use mailrip_types::{DefectHistogram, ErrorHistogram};

use super::{OutputSink, SinkHandle};

#[derive(Debug)]
pub struct FilesystemSink {
    root: PathBuf,
    handles: HashMap<u64, (PathBuf, File)>,
    next_handle: u64,
    /// Every primary (non-alias) name written so far, in emission order;
    /// consulted by [`FilesystemSink::remove_nameless`].
    created: Vec<String>,
}

impl FilesystemSink {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(FilesystemSink {
            root,
            handles: HashMap::new(),
            next_handle: 0,
            created: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names passed to [`OutputSink::create`] so far, in emission order.
    pub fn created_names(&self) -> &[String] {
        &self.created
    }

    fn path_for(&self, logical_name: &str) -> PathBuf {
        self.root.join(logical_name)
    }

    /// Delete every created file whose name is exactly `prefix` followed
    /// by one or more ASCII digits. Run this after extraction has completed; names are
    /// matched from [`FilesystemSink::created_names`], not re-scanned
    /// from the directory, so a coincidentally named real attachment
    /// from a different message is never touched.
    pub fn remove_nameless(&self, prefix: &str) -> std::io::Result<()> {
        for name in &self.created {
            let Some(digits) = name.strip_prefix(prefix) else {
                continue;
            };
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                let path = self.path_for(name);
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }
}

impl OutputSink for FilesystemSink {
    type Error = std::io::Error;

    fn create(&mut self, logical_name: &str) -> Result<SinkHandle, Self::Error> {
        let path = self.path_for(logical_name);
        let file = File::create(&path)?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle, (path, file));
        self.created.push(logical_name.to_string());
        Ok(SinkHandle(handle))
    }

    fn write(&mut self, handle: SinkHandle, bytes: &[u8]) -> Result<(), Self::Error> {
        let (_, file) = self
            .handles
            .get_mut(&handle.0)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "unknown handle"))?;
        file.write_all(bytes)
    }

    fn close(&mut self, handle: SinkHandle) -> Result<(), Self::Error> {
        if let Some((_, mut file)) = self.handles.remove(&handle.0) {
            file.flush()?;
        }
        Ok(())
    }

    fn rename_collision(&mut self, logical_name: &str, attempt: u32) -> String {
        format!("{logical_name}_{attempt}")
    }

    fn link(&mut self, existing: SinkHandle, alias: &str) -> Result<(), Self::Error> {
        let (existing_path, _) = self
            .handles
            .get(&existing.0)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "unknown handle"))?;
        let existing_path = existing_path.clone();
        let alias_path = self.path_for(alias);
        // Prefer a hardlink; fall back to a content copy if the filesystem
        // doesn't support hardlinks across the sink's directory.
        if fs::hard_link(&existing_path, &alias_path).is_err() {
            fs::copy(&existing_path, &alias_path)?;
        }
        Ok(())
    }

    fn report_defects(&mut self, _defects: &DefectHistogram) {
        // The filesystem sink has no metadata channel of its own; a
        // caller that wants a defect report should wrap this sink or
        // consult the `HeaderRecord` returned by the walker directly.
    }

    fn report_errors(&mut self, _errors: &ErrorHistogram) {
        // Same rationale as `report_defects`: consult the `HeaderRecord`.
    }
}

/// Async mirror of a handful of [`FilesystemSink`] operations, for
/// callers already inside a tokio runtime.
#[cfg(feature = "tokio")]
impl FilesystemSink {
    /// Async equivalent of [`OutputSink::create`] followed immediately
    /// by [`OutputSink::write`] and [`OutputSink::close`], for a caller
    /// that already has the whole payload in memory (the common case
    /// once the walker has finished decoding a part).
    pub async fn write_async(&mut self, logical_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let path = self.path_for(logical_name);
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// Async equivalent of [`OutputSink::link`].
    pub async fn link_async(&mut self, existing_name: &str, alias: &str) -> std::io::Result<()> {
        let existing_path = self.path_for(existing_name);
        let alias_path = self.path_for(alias);
        if tokio::fs::hard_link(&existing_path, &alias_path).await.is_err() {
            tokio::fs::copy(&existing_path, &alias_path).await?;
        }
        Ok(())
    }
}
