use thiserror::Error;

/// Result alias used throughout `timpani-codec`.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding a wire buffer.
///
/// Corresponds to the `Protocol` error kind of the system-wide taxonomy
/// (spec §7): every variant here means the peer sent (or we were asked to
/// decode) bytes that do not describe a valid value, never an I/O failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The decoder ran off the front of the buffer before finishing a field.
    /// Mirrors `libtrpc`'s `TRUNCATED` return code.
    #[error("truncated buffer: needed {needed} more byte(s), {remaining} available")]
    Truncated { needed: usize, remaining: usize },

    /// A decoded blob was not valid UTF-8 where a string was expected.
    #[error("blob is not valid UTF-8")]
    InvalidUtf8,

    /// A decoded enum discriminant (e.g. `SchedPolicy`) had no known variant.
    #[error("unrecognized wire discriminant: {0}")]
    UnknownDiscriminant(i32),
}
