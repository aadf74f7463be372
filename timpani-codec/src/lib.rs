//! Reverse length-prefix-suffix binary codec for the Timpani wire format
//! (spec §4.1, §6).
//!
//! Values are appended to a buffer in the order they are produced; a blob or
//! string follows its payload with a 4-byte big-endian length rather than
//! preceding it. Decoding walks the same buffer from its tail backward, so
//! the last value written is the first one read back out — this is the
//! behavior `libtrpc`'s `serialize_*`/`deserialize_*` pairs implement in C,
//! kept exactly here.

mod buffer;
mod error;
mod plan;

pub use buffer::{Decoder, Encoder};
pub use error::{CodecError, CodecResult};
pub use plan::{decode_sched_info, encode_sched_info, DecodedSchedInfo};
