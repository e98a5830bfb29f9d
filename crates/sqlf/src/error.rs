use thiserror::Error;

use crate::arg::ArgType;

/// Everything that can go wrong while rendering a query.
///
/// All variants are terminal for the render call: no partial output is ever
/// returned, and none of these are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("saw dangerous characters in SQL query at offset {offset}")]
    DangerousSequence { offset: usize },

    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("expected {expected} argument, got {actual}")]
    TypeMismatch { expected: ArgType, actual: ArgType },

    #[error("invalid value type {actual} for format string %{spec} at offset {offset}")]
    FormatMismatch {
        offset: usize,
        spec: char,
        actual: ArgType,
    },

    #[error("cannot convert {actual} argument to a string value")]
    UnsupportedConversion { actual: ArgType },

    #[error("structural error at offset {offset}: {message}")]
    Structural { offset: usize, message: String },
}

impl Error {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn structural(offset: usize, message: impl Into<String>) -> Self {
        Error::Structural {
            offset,
            message: message.into(),
        }
    }
}
