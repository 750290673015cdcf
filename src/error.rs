//! Crate-level error type. Wraps the closed [`ErrorKind`] set from
//! The closed error-kind set, plus the one variant that is "propagated upward
//! verbatim": a failed sink write.

use mailrip_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Kind(#[from] ErrorKind),

    #[error("sink write failed: {0}")]
    SinkWrite(#[source] std::io::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
