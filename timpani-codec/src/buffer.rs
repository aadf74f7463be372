use crate::error::{CodecError, CodecResult};

/// Buffers under this size are rare in practice (one task record is ~40
/// bytes); starting here keeps small plans to a single allocation while
/// still matching `serialize.c`'s "start small, grow on demand" policy.
const INITIAL_CAPACITY: usize = 256;

/// Append-only write cursor for the Timpani wire format (spec §4.1).
///
/// Every value — scalar or blob — is written at the current end of the
/// buffer and the cursor advances past it, exactly like `libtrpc`'s
/// `serialize_*` family. There is no length prefix ahead of a value; a blob
/// or string instead appends its own length as a 4-byte big-endian suffix
/// immediately after its payload. [`Decoder`] undoes this by reading the
/// same buffer from its tail backward, so whatever was encoded last is
/// decoded first.
///
/// Growth is delegated to `Vec`'s own amortized doubling rather than
/// hand-rolled `realloc` bookkeeping, which gives the same "double the
/// capacity, or grow by exactly what's needed for a single oversized
/// value" behavior the original's `reserve_space` implements.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Encoder { buf: Vec::with_capacity(cap) }
    }

    /// Bytes written so far.
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    pub fn put_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Appends `bytes` followed by its length as a 4-byte big-endian suffix.
    pub fn put_blob(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.put_u32(bytes.len() as u32);
    }

    pub fn put_str(&mut self, s: &str) {
        self.put_blob(s.as_bytes());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Read cursor that mirrors a buffer produced by [`Encoder`] back out from
/// its tail, one field at a time.
///
/// `pos` is the index of the current logical end of the unread region; each
/// `get_*` call shrinks it by the size of the value being read. A string or
/// blob's trailing length suffix is consumed first, then its payload.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: buf.len() }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.pos
    }

    fn take_tail(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.pos < n {
            return Err(CodecError::Truncated { needed: n, remaining: self.pos });
        }
        self.pos -= n;
        Ok(&self.buf[self.pos..self.pos + n])
    }

    pub fn get_i8(&mut self) -> CodecResult<i8> {
        Ok(self.take_tail(1)?[0] as i8)
    }

    pub fn get_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take_tail(1)?[0])
    }

    pub fn get_i16(&mut self) -> CodecResult<i16> {
        let b = self.take_tail(2)?;
        Ok(i16::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_i32(&mut self) -> CodecResult<i32> {
        let b = self.take_tail(4)?;
        Ok(i32::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_u32(&mut self) -> CodecResult<u32> {
        let b = self.take_tail(4)?;
        Ok(u32::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_i64(&mut self) -> CodecResult<i64> {
        let b = self.take_tail(8)?;
        Ok(i64::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_u64(&mut self) -> CodecResult<u64> {
        let b = self.take_tail(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_f32(&mut self) -> CodecResult<f32> {
        let b = self.take_tail(4)?;
        Ok(f32::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn get_f64(&mut self) -> CodecResult<f64> {
        let b = self.take_tail(8)?;
        Ok(f64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a blob's length suffix, then its payload, mirroring
    /// [`Encoder::put_blob`].
    pub fn get_blob(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.get_u32()? as usize;
        Ok(self.take_tail(len)?.to_vec())
    }

    pub fn get_str(&mut self) -> CodecResult<String> {
        let bytes = self.get_blob()?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips_in_reverse_order() {
        let mut enc = Encoder::new();
        enc.put_i32(42);
        enc.put_i64(-7);
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_i64().unwrap(), -7);
        assert_eq!(dec.get_i32().unwrap(), 42);
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn blob_layout_matches_worked_example() {
        // spec §8 scenario 6: encode str("abcd") then an i64.
        let mut enc = Encoder::new();
        enc.put_str("abcd");
        enc.put_i64(99);
        let bytes = enc.into_bytes();

        // Physical layout: "abcd" (4) | len=4 (4) | i64 (8) = 16 bytes.
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], b"abcd");
        assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 4);

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_i64().unwrap(), 99);
        assert_eq!(dec.get_str().unwrap(), "abcd");
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn truncated_scalar_read_fails_cleanly() {
        let bytes = [0u8; 3];
        let mut dec = Decoder::new(&bytes);
        assert!(matches!(dec.get_i64(), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn truncated_blob_length_suffix_fails_cleanly() {
        let bytes = [0u8; 2];
        let mut dec = Decoder::new(&bytes);
        assert!(matches!(dec.get_blob(), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn blob_payload_shorter_than_claimed_length_fails_cleanly() {
        let mut enc = Encoder::new();
        enc.put_u32(10); // claims a 10-byte payload that was never written
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        assert!(matches!(dec.get_blob(), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn invalid_utf8_blob_is_rejected_as_string() {
        let mut enc = Encoder::new();
        enc.put_blob(&[0xff, 0xfe]);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_str(), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn position_advances_by_exact_field_sizes() {
        let mut enc = Encoder::new();
        enc.put_i8(1);
        enc.put_i32(2);
        enc.put_blob(b"xy");
        assert_eq!(enc.pos(), 1 + 4 + 2 + 4);
    }
}
