//! Error types for dmpatch operations.

/// Result type for dmpatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned when decoding serialized patches or deltas, validating a
/// configuration, or running a compression codec.
///
/// The diff and match engines never fail; they degrade instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A patch header did not match `@@ -a,b +c,d @@`.
    #[error("Invalid patch header: {0:?}")]
    InvalidHeader(String),

    /// A patch body line started with an unknown prefix character.
    #[error("Invalid patch mode {mode:?} in line {line:?}")]
    InvalidLineMode {
        /// The unrecognized prefix character
        mode: char,
        /// The offending line
        line: String,
    },

    /// A patch body does not add up to the lengths declared in its header.
    #[error(
        "Patch body does not match header {header:?}: \
         expected lengths {expected1}/{expected2}, got {actual1}/{actual2}"
    )]
    LengthMismatch {
        /// Header of the offending patch
        header: String,
        /// Declared source length
        expected1: usize,
        /// Declared target length
        expected2: usize,
        /// Source length found in the body
        actual1: usize,
        /// Target length found in the body
        actual2: usize,
    },

    /// Percent-encoded text was malformed or decoded to invalid UTF-8.
    #[error("Invalid percent-encoding: {0}")]
    InvalidEncoding(String),

    /// A diff delta token was malformed or overran the source text.
    #[error("Invalid delta token: {0}")]
    InvalidDeltaToken(String),

    /// A diff delta did not consume the whole source text.
    #[error("Delta length {consumed} does not match source text length {expected}")]
    DeltaLengthMismatch {
        /// Characters consumed by the delta
        consumed: usize,
        /// Length of the source text
        expected: usize,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested codec was not compiled in.
    #[error("Codec {0} is not available, enable the `{0}` feature")]
    CodecUnavailable(&'static str),

    /// Compression or decompression failed.
    #[error("Codec error: {0}")]
    Codec(String),
}
