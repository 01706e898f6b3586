//! Primitive field codecs, following the host game's packet conventions:
//! big-endian numbers, VarInt-prefixed UTF-8 strings, one-byte booleans.

use bytes::{Buf, BufMut, BytesMut};

use crate::DecodeError;

/// Longest string, in characters, the host accepts by default.
pub const MAX_STRING_LENGTH: usize = 32767;

const MAX_VAR_INT_BYTES: usize = 5;

pub struct PacketReader<'a, B: Buf> {
    buf: &'a mut B,
}

impl<'a, B: Buf> PacketReader<'a, B> {
    pub fn new(buf: &'a mut B) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated { needed, remaining });
        }
        Ok(())
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8() != 0)
    }

    pub fn read_var_int(&mut self) -> Result<i32, DecodeError> {
        let mut value: u32 = 0;

        for i in 0..MAX_VAR_INT_BYTES {
            self.ensure(1)?;
            let byte = self.buf.get_u8();
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }

        Err(DecodeError::VarIntTooLong)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        self.read_string_max(MAX_STRING_LENGTH)
    }

    pub fn read_string_max(&mut self, max_chars: usize) -> Result<String, DecodeError> {
        let len = self.read_var_int()?;
        let byte_len = usize::try_from(len)
            .ok()
            .filter(|&n| n <= max_chars * 4)
            .ok_or(DecodeError::InvalidStringLength(len))?;

        self.ensure(byte_len)?;
        let bytes = self.buf.copy_to_bytes(byte_len);
        let s = std::str::from_utf8(&bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        if s.chars().count() > max_chars {
            return Err(DecodeError::InvalidStringLength(len));
        }

        Ok(s.to_string())
    }
}

/// Builds payloads in the same format [`PacketReader`] consumes.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32(v);
        self
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.buf.put_f32(v);
        self
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.buf.put_u8(u8::from(v));
        self
    }

    pub fn write_var_int(&mut self, v: i32) -> &mut Self {
        let mut value = v as u32;
        loop {
            if value & !0x7f == 0 {
                self.buf.put_u8(value as u8);
                return self;
            }
            self.buf.put_u8((value & 0x7f) as u8 | 0x80);
            value >>= 7;
        }
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_var_int(s.len() as i32);
        self.buf.put_slice(s.as_bytes());
        self
    }

    pub fn finish(&mut self) -> BytesMut {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_int_matches_reference_encodings() {
        let cases: [(i32, &[u8]); 5] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (300, &[0xac, 0x02]),
            (2_147_483_647, &[0xff, 0xff, 0xff, 0xff, 0x07]),
            (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
        ];

        for (value, bytes) in cases {
            let encoded = PacketWriter::new().write_var_int(value).finish();
            assert_eq!(&encoded[..], bytes, "encoding {value}");

            let mut buf = bytes;
            assert_eq!(PacketReader::new(&mut buf).read_var_int().unwrap(), value);
        }
    }

    #[test]
    fn overlong_var_int_is_rejected() {
        let mut buf: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(
            PacketReader::new(&mut buf).read_var_int(),
            Err(DecodeError::VarIntTooLong)
        );
    }

    #[test]
    fn truncated_reads_report_what_was_missing() {
        let mut buf: &[u8] = &[0x00, 0x01];
        assert_eq!(
            PacketReader::new(&mut buf).read_i32(),
            Err(DecodeError::Truncated { needed: 4, remaining: 2 })
        );

        let mut buf: &[u8] = &[0x05, b'n', b'o'];
        assert_eq!(
            PacketReader::new(&mut buf).read_string(),
            Err(DecodeError::Truncated { needed: 5, remaining: 2 })
        );
    }

    #[test]
    fn strings_are_length_checked_and_utf8() {
        let mut buf: &[u8] = &[0x02, 0xc3, 0x28];
        assert_eq!(PacketReader::new(&mut buf).read_string(), Err(DecodeError::InvalidUtf8));

        let mut payload = PacketWriter::new().write_string("north").finish();
        assert_eq!(
            PacketReader::new(&mut payload).read_string_max(3),
            Err(DecodeError::InvalidStringLength(5))
        );

        let mut negative = PacketWriter::new().write_var_int(-1).finish();
        assert_eq!(
            PacketReader::new(&mut negative).read_string(),
            Err(DecodeError::InvalidStringLength(-1))
        );
    }
}
