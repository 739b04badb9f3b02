use crate::{ErrorKind, Result};

/// MSB-first bit reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_offset: usize,
}
impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            bit_offset: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = self.bit_offset / 8;
        track_assert!(
            byte < self.data.len(),
            ErrorKind::InvalidInput,
            "Reached end of data"
        );
        let bit = (self.data[byte] >> (7 - (self.bit_offset % 8))) & 1;
        self.bit_offset += 1;
        Ok(bit == 1)
    }

    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        track_assert!(n <= 32, ErrorKind::InvalidInput, "Too many bits: {}", n);
        let mut value = 0;
        for _ in 0..n {
            value = (value << 1) | track!(self.read_bit())? as u32;
        }
        Ok(value)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        track_assert!(
            self.bit_offset + n <= self.data.len() * 8,
            ErrorKind::InvalidInput,
            "Reached end of data"
        );
        self.bit_offset += n;
        Ok(())
    }
}
