//! The defect histogram: a fixed-size, never-cleared count of non-fatal
//! protocol violations observed while parsing one message.

use core::fmt;

/// A single non-fatal protocol violation kind.
///
/// This is a closed set: the header parser and the MIME walker only ever
/// record one of these, and the histogram is sized to match exactly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Defect {
    MissingSeparators = 0,
    MultipleFieldOccurrence,
    UnbalancedBoundaryQuote,
    MultipleBoundaries,
    MultipleColonSeparators,
    MultipleEqualsSeparators,
    UnbalancedQuotes,
    MultipleQuotes,
    MultipleNames,
    MultipleFilenames,
}

impl Defect {
    pub const COUNT: usize = 10;

    pub const ALL: [Defect; Defect::COUNT] = [
        Defect::MissingSeparators,
        Defect::MultipleFieldOccurrence,
        Defect::UnbalancedBoundaryQuote,
        Defect::MultipleBoundaries,
        Defect::MultipleColonSeparators,
        Defect::MultipleEqualsSeparators,
        Defect::UnbalancedQuotes,
        Defect::MultipleQuotes,
        Defect::MultipleNames,
        Defect::MultipleFilenames,
    ];

    /// Human-readable description, matching `MIMEH_defect_description_array`.
    pub fn description(self) -> &'static str {
        match self {
            Defect::MissingSeparators => "Missing separators",
            Defect::MultipleFieldOccurrence => "Multiple field occurrence",
            Defect::UnbalancedBoundaryQuote => "Unbalanced boundary quote",
            Defect::MultipleBoundaries => "Multiple boundaries",
            Defect::MultipleColonSeparators => "Multiple colon separators",
            Defect::MultipleEqualsSeparators => "Multiple equals separators",
            Defect::UnbalancedQuotes => "Unbalanced quotes",
            Defect::MultipleQuotes => "Multiple quotes",
            Defect::MultipleNames => "Multiple names",
            Defect::MultipleFilenames => "Multiple filenames",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Per-message defect counts. Incremented, never cleared mid-message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefectHistogram {
    counts: [u32; Defect::COUNT],
}

impl DefectHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, defect: Defect) {
        self.counts[defect.index()] += 1;
    }

    pub fn count(&self, defect: Defect) -> u32 {
        self.counts[defect.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &DefectHistogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    /// Iterate over non-zero entries, for reporting to the sink on message close.
    pub fn nonzero(&self) -> impl Iterator<Item = (Defect, u32)> + '_ {
        Defect::ALL
            .into_iter()
            .filter(move |d| self.count(*d) > 0)
            .map(move |d| (d, self.count(d)))
    }
}
