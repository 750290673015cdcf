//! The outer-message header record.

use crate::defect::DefectHistogram;
use crate::error::ErrorHistogram;

/// One per top-level message. The first non-empty `Subject:` wins and is
/// preserved against clobbering by nested parts.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderRecord {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub message_id: Option<String>,
    pub first_received: Option<String>,
    pub defects: DefectHistogram,
    /// Non-fatal `ErrorKind` occurrences registered during the walk
    /// (`cycle_detected`, `boundary_crash`,
    /// `decoder_input_stream_broken`, ...) — counted the same way as
    /// `defects`, but over the closed error-kind set rather than the
    /// header-parser defect set.
    pub errors: ErrorHistogram,
}

impl HeaderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject, but only if none has been recorded yet — this is
    /// the "first non-empty subject wins" invariant.
    pub fn set_subject_if_unset(&mut self, subject: impl Into<String>) {
        if self.subject.is_none() {
            let subject = subject.into();
            if !subject.is_empty() {
                self.subject = Some(subject);
            }
        }
    }

    pub fn set_first_received_if_unset(&mut self, received: impl Into<String>) {
        if self.first_received.is_none() {
            self.first_received = Some(received.into());
        }
    }
}
