#![deny(missing_debug_implementations)]

//! Pure data model shared by the `mailrip` codec: MIME part records,
//! the defect histogram, and the CFBF/TNEF wire structures.
//!
//! This crate holds no I/O and no parsing logic — see the `mailrip`
//! crate for the header parser, content-transfer decoders, the MIME
//! walker, and the CFBF/TNEF readers that populate these types.

#[cfg(feature = "ole")]
pub mod cfbf;
pub mod content_type;
pub mod defect;
pub mod disposition;
pub mod encoding;
pub mod error;
pub mod header_record;
pub mod part;
#[cfg(feature = "tnef")]
pub mod tnef;

pub use content_type::ContentType;
pub use defect::{Defect, DefectHistogram};
pub use disposition::ContentDisposition;
pub use encoding::ContentTransferEncoding;
pub use error::{ErrorHistogram, ErrorKind, Termination};
pub use header_record::HeaderRecord;
pub use part::MimePart;
