//! A minimal forward-only byte cursor for the binary `PROG` format: manual
//! offset bookkeeping rather than pulling in a parser-combinator crate for a
//! four-field header format.

use jr100_core::error::FormatError;

pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads a little-endian `u32`, returning `Ok(None)` only at a clean
    /// end-of-input (zero bytes left); a short trailing read is still an
    /// error.
    pub(crate) fn read_u32_optional(&mut self) -> Result<Option<u32>, FormatError> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        self.read_u32().map(Some)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, FormatError> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::UnexpectedEof { context: "PROG record" });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// A `u32` length prefix followed by that many UTF-8 bytes.
    pub(crate) fn read_string(&mut self, max_length: u32) -> Result<String, FormatError> {
        let length = self.read_u32()?;
        if length > max_length {
            return Err(FormatError::StringTooLong { length, max: max_length });
        }
        if length == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_exact(length as usize)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
