//! The closed error-kind set. Every one of these is a
//! return value, never a panic.

use core::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ErrorKind {
    #[error("byte source exhausted where content was expected")]
    InputExhausted,
    #[error("recursion limit reached")]
    RecursionLimitReached,
    #[error("content-transfer decoder ran out mid-group")]
    DecoderInputStreamBroken,
    #[error("boundary appeared inside a raw-binary body")]
    BoundaryCrash,
    #[error("zero-length part")]
    ZeroLengthPart,
    #[error("CFBF header invariant violated")]
    InsaneCfbfHeader,
    #[error("FAT/miniFAT chain revisited a sector")]
    CycleDetected,
    #[error("FAT/DIF load would exceed declared bounds")]
    MemoryBoundExceeded,
    #[error("sink write failed")]
    SinkWriteFailed,
    #[error("cancelled")]
    Cancelled,
}

impl ErrorKind {
    pub const COUNT: usize = 10;

    pub const ALL: [ErrorKind; ErrorKind::COUNT] = [
        ErrorKind::InputExhausted,
        ErrorKind::RecursionLimitReached,
        ErrorKind::DecoderInputStreamBroken,
        ErrorKind::BoundaryCrash,
        ErrorKind::ZeroLengthPart,
        ErrorKind::InsaneCfbfHeader,
        ErrorKind::CycleDetected,
        ErrorKind::MemoryBoundExceeded,
        ErrorKind::SinkWriteFailed,
        ErrorKind::Cancelled,
    ];

    /// True for the two reasons that abort the enclosing
    /// multipart rather than just ending the current part.
    pub fn aborts_enclosing_multipart(self) -> bool {
        matches!(
            self,
            ErrorKind::InputExhausted | ErrorKind::RecursionLimitReached
        )
    }

    fn index(self) -> usize {
        match self {
            ErrorKind::InputExhausted => 0,
            ErrorKind::RecursionLimitReached => 1,
            ErrorKind::DecoderInputStreamBroken => 2,
            ErrorKind::BoundaryCrash => 3,
            ErrorKind::ZeroLengthPart => 4,
            ErrorKind::InsaneCfbfHeader => 5,
            ErrorKind::CycleDetected => 6,
            ErrorKind::MemoryBoundExceeded => 7,
            ErrorKind::SinkWriteFailed => 8,
            ErrorKind::Cancelled => 9,
        }
    }
}

/// Per-message count of the non-fatal `ErrorKind` occurrences that are
/// "registered" rather than propagated (`cycle_detected`,
/// `boundary_crash`, `decoder_input_stream_broken`, and so on) — the
/// error-kind analogue of [`crate::defect::DefectHistogram`], reported to
/// the sink alongside the defect histogram on message close.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorHistogram {
    counts: [u32; ErrorKind::COUNT],
}

impl ErrorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ErrorKind) {
        self.counts[kind.index()] += 1;
    }

    pub fn count(&self, kind: ErrorKind) -> u32 {
        self.counts[kind.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &ErrorHistogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    /// Iterate over non-zero entries, for reporting to the sink on message close.
    pub fn nonzero(&self) -> impl Iterator<Item = (ErrorKind, u32)> + '_ {
        ErrorKind::ALL
            .into_iter()
            .filter(move |k| self.count(*k) > 0)
            .map(move |k| (k, self.count(k)))
    }
}

#[cfg(test)]
mod error_histogram_tests {
    use super::*;

    #[test]
    fn records_and_reports_only_nonzero() {
        let mut h = ErrorHistogram::new();
        assert!(h.is_empty());
        h.record(ErrorKind::CycleDetected);
        h.record(ErrorKind::CycleDetected);
        h.record(ErrorKind::BoundaryCrash);
        assert_eq!(h.count(ErrorKind::CycleDetected), 2);
        assert_eq!(h.total(), 3);
        let reported: Vec<_> = h.nonzero().collect();
        assert_eq!(reported.len(), 2);
    }

    #[test]
    fn merge_accumulates() {
        let mut a = ErrorHistogram::new();
        a.record(ErrorKind::DecoderInputStreamBroken);
        let mut b = ErrorHistogram::new();
        b.record(ErrorKind::DecoderInputStreamBroken);
        b.record(ErrorKind::CycleDetected);
        a.merge(&b);
        assert_eq!(a.count(ErrorKind::DecoderInputStreamBroken), 2);
        assert_eq!(a.count(ErrorKind::CycleDetected), 1);
    }
}

/// Termination reason returned up the recursion by the MIME walker and
/// the content-transfer decoders.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    Ok,
    HitBoundary,
    EndOfInput,
    RecursionLimitReached,
    ZeroLengthPart,
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Ok => "ok",
            Termination::HitBoundary => "hit_boundary",
            Termination::EndOfInput => "end_of_input",
            Termination::RecursionLimitReached => "recursion_limit_reached",
            Termination::ZeroLengthPart => "zero_length_part",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
