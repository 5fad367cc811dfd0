//! Configuration errors.
//!
//! Truncation itself never fails; only building an
//! [`EllipsisConfig`](crate::EllipsisConfig) from user input can.

use core::fmt;

/// Error returned when an ellipsis configuration is rejected.
#[derive(Debug)]
pub enum EllipsisError {
    /// A literal separator was empty.
    InvalidSeparator,
    /// A separator or token pattern failed to compile.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    /// `max_lines` was zero.
    InvalidMaxLines,
    /// Serialized configuration could not be parsed.
    Config(serde_json::Error),
}

impl fmt::Display for EllipsisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSeparator => write!(f, "separator must not be empty"),
            Self::InvalidPattern { pattern, source } => {
                write!(f, "invalid separator pattern {:?}: {}", pattern, source)
            }
            Self::InvalidMaxLines => write!(f, "max_lines must be at least 1"),
            Self::Config(err) => write!(f, "invalid ellipsis config: {}", err),
        }
    }
}

impl std::error::Error for EllipsisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
            Self::Config(err) => Some(err),
            Self::InvalidSeparator | Self::InvalidMaxLines => None,
        }
    }
}

impl From<serde_json::Error> for EllipsisError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}
