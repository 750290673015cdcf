//! The output sink abstraction.
//!
//! The core never opens raw files itself; every decoded byte stream, and
//! every alias of it, passes through this trait. Two concrete
//! implementations ship with the crate: [`fs::FilesystemSink`] and
//! [`memory::MemorySink`].

pub mod fs;
pub mod memory;

use mailrip_types::{DefectHistogram, ErrorHistogram};

/// Opaque handle to an open output, returned by [`OutputSink::create`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SinkHandle(pub u64);

/// The external collaborator that receives decoded payload bytes,
/// independently of their destination.
pub trait OutputSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create(&mut self, logical_name: &str) -> Result<SinkHandle, Self::Error>;
    fn write(&mut self, handle: SinkHandle, bytes: &[u8]) -> Result<(), Self::Error>;
    fn close(&mut self, handle: SinkHandle) -> Result<(), Self::Error>;

    /// Called when `create` would collide with an existing logical name;
    /// returns the name actually used.
    fn rename_collision(&mut self, logical_name: &str, attempt: u32) -> String;

    /// Register an additional logical name for an already-created
    /// output. The
    /// default implementation copies the bytes already written under
    /// `existing`; a filesystem sink may hardlink instead.
    fn link(&mut self, existing: SinkHandle, alias: &str) -> Result<(), Self::Error>;

    /// Report the final per-message defect histogram.
    fn report_defects(&mut self, _defects: &DefectHistogram) {}

    /// Report the final per-message count of registered non-fatal
    /// `ErrorKind` occurrences (`cycle_detected`, `boundary_crash`,
    /// `decoder_input_stream_broken`, ...).
    fn report_errors(&mut self, _errors: &ErrorHistogram) {}

    /// Stage a temporary file for one mbox-split message; returns a handle the walker can read back from.
    fn create_staging(&mut self, _name: &str) -> Result<SinkHandle, Self::Error> {
        self.create(_name)
    }

    fn delete_staging(&mut self, handle: SinkHandle) -> Result<(), Self::Error> {
        self.close(handle)
    }
}
