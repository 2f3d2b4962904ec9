//! Binary wire helpers: unsigned LEB128 varints and length-prefixed bytes.
//!
//! Decoding is strict. Overlong varints, values past `u64::MAX`, lengths
//! that run past the end of the buffer and unread trailing bytes are all
//! rejected with [`KeysError::DecodeError`].

use crate::error::{KeysError, Result};

/// Maximum number of bytes a LEB128-encoded `u64` can occupy.
pub const MAX_VARINT_BYTES: usize = 10;

/// Append `value` as an unsigned LEB128 varint.
pub fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Append a varint length prefix followed by `bytes`.
pub fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_uvarint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| truncated("byte"))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_uvarint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            let low = u64::from(byte & 0x7f);
            if i == MAX_VARINT_BYTES - 1 && byte > 0x01 {
                return Err(KeysError::DecodeError("varint overflows u64".to_string()));
            }
            value |= low << (7 * i);
            if byte & 0x80 == 0 {
                if byte == 0 && i > 0 {
                    return Err(KeysError::DecodeError("overlong varint".to_string()));
                }
                return Ok(value);
            }
        }
        Err(KeysError::DecodeError("varint too long".to_string()))
    }

    /// Read a varint length and that many bytes.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_uvarint()?;
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= self.remaining())
            .ok_or_else(|| truncated("length-prefixed field"))?;
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Fail if any bytes are left unread.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(KeysError::DecodeError(format!("{} trailing bytes", n))),
        }
    }
}

fn truncated(what: &str) -> KeysError {
    KeysError::DecodeError(format!("truncated input while reading {}", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, value);
        buf
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(1), [0x01]);
        assert_eq!(encode(127), [0x7f]);
        assert_eq!(encode(128), [0x80, 0x01]);
        assert_eq!(encode(300), [0xac, 0x02]);
        assert_eq!(encode(u64::MAX).len(), MAX_VARINT_BYTES);
    }

    #[test]
    fn test_read_uvarint() {
        for value in [0, 1, 127, 128, 300, 16_384, u32::MAX as u64, u64::MAX] {
            let buf = encode(value);
            let mut reader = Reader::new(&buf);
            assert_eq!(reader.read_uvarint().unwrap(), value);
            reader.finish().unwrap();
        }
    }

    #[test]
    fn test_rejects_overlong_and_overflow() {
        assert!(Reader::new(&[0x80, 0x00]).read_uvarint().is_err());

        let mut overflow = vec![0xff; 9];
        overflow.push(0x02);
        assert!(Reader::new(&overflow).read_uvarint().is_err());

        assert!(Reader::new(&[0x80, 0x80]).read_uvarint().is_err());
    }

    #[test]
    fn test_read_bytes() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, b"hello");
        put_bytes(&mut buf, b"");

        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_bytes().unwrap(), b"hello");
        assert_eq!(reader.read_bytes().unwrap(), b"");
        reader.finish().unwrap();
    }

    #[test]
    fn test_read_bytes_truncated() {
        let mut reader = Reader::new(&[0x05, b'a', b'b']);
        match reader.read_bytes() {
            Err(KeysError::DecodeError(msg)) => assert!(msg.contains("truncated")),
            _ => panic!("Expected DecodeError"),
        }
    }

    #[test]
    fn test_finish_rejects_trailing_bytes() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        reader.read_u8().unwrap();
        assert!(matches!(reader.finish(), Err(KeysError::DecodeError(_))));
    }
}
