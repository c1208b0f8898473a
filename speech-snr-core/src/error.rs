use core::{error, fmt};

/// Errors raised whilst running speech-snr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument passed into a function was invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// A required input collection was empty.
    EmptyInput {
        /// Name of the empty argument.
        arg: String,
    },
    /// Array shapes could not be combined.
    ShapeMismatch {
        /// Name of the offending argument.
        arg: String,
        /// Shape required by the operation.
        expected: Vec<usize>,
        /// Shape that was received.
        got: Vec<usize>,
    },
    /// The convolution backend failed.
    Conv {
        /// Backend error message.
        reason: String,
    },
    /// A filter coefficient resource could not be read or was malformed.
    FilterLoad {
        /// Why the resource was rejected.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::EmptyInput { arg } => write!(f, "Input `{arg}` was empty."),
            Error::ShapeMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Shape mismatch on `{arg}`. Expected {expected:?}, got {got:?}."
                )
            }
            Error::Conv { reason } => write!(f, "Convolution failed: {reason}"),
            Error::FilterLoad { reason } => write!(f, "Could not load filter: {reason}"),
        }
    }
}

impl error::Error for Error {}

/// Result alias over [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
