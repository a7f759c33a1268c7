use super::{DecodeError, WORD_SIZE};
use clmm_lens_domain::entities::Address;
use primitive_types::U256;

/// Reads typed values from the words of a call result.
#[derive(Debug, Clone, Copy)]
pub struct AbiDecoder<'a> {
    data: &'a [u8],
}

impl<'a> AbiDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Fails unless the result holds at least `words` words.
    pub fn require_words(&self, words: usize) -> Result<(), DecodeError> {
        let needed = words * WORD_SIZE;
        if self.data.len() < needed {
            return Err(DecodeError::TooShort {
                needed,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    /// Raw word at `index`.
    pub fn word(&self, index: usize) -> Result<&'a [u8], DecodeError> {
        let start = index * WORD_SIZE;
        let end = start + WORD_SIZE;
        self.data.get(start..end).ok_or(DecodeError::TooShort {
            needed: end,
            got: self.data.len(),
        })
    }

    pub fn uint(&self, index: usize) -> Result<U256, DecodeError> {
        Ok(U256::from_big_endian(self.word(index)?))
    }

    /// Unsigned word that must fit in `bits` bits.
    fn uint_bits(&self, index: usize, bits: usize, field: &'static str) -> Result<U256, DecodeError> {
        let value = self.uint(index)?;
        if value.bits() > bits {
            return Err(DecodeError::OutOfRange { field });
        }
        Ok(value)
    }

    pub fn uint128(&self, index: usize, field: &'static str) -> Result<u128, DecodeError> {
        Ok(self.uint_bits(index, 128, field)?.as_u128())
    }

    pub fn uint24(&self, index: usize, field: &'static str) -> Result<u32, DecodeError> {
        Ok(self.uint_bits(index, 24, field)?.as_u32())
    }

    pub fn uint8(&self, index: usize, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.uint_bits(index, 8, field)?.as_u32() as u8)
    }

    /// Usize for offsets and lengths; anything beyond 32 bits is treated as
    /// out of bounds rather than allocated.
    fn uint_usize(&self, index: usize) -> Result<usize, DecodeError> {
        let value = self.uint(index)?;
        if value.bits() > 32 {
            return Err(DecodeError::BadOffset(usize::MAX));
        }
        Ok(value.as_u64() as usize)
    }

    /// Two's complement word that must fit in `bits` bits (at most 128).
    ///
    /// Every byte above the value must repeat its sign bit.
    fn int_bits(&self, index: usize, bits: u32, field: &'static str) -> Result<i128, DecodeError> {
        let word = self.word(index)?;
        let negative = word[0] & 0x80 != 0;
        let fill = if negative { 0xff } else { 0x00 };
        if word[..16].iter().any(|b| *b != fill) {
            return Err(DecodeError::OutOfRange { field });
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        let value = i128::from_be_bytes(low);
        if (value < 0) != negative {
            return Err(DecodeError::OutOfRange { field });
        }
        let limit = 1i128 << (bits - 1);
        if bits < 128 && (value < -limit || value >= limit) {
            return Err(DecodeError::OutOfRange { field });
        }
        Ok(value)
    }

    pub fn int24(&self, index: usize, field: &'static str) -> Result<i32, DecodeError> {
        Ok(self.int_bits(index, 24, field)? as i32)
    }

    pub fn int128(&self, index: usize, field: &'static str) -> Result<i128, DecodeError> {
        self.int_bits(index, 128, field)
    }

    /// Address in the low 20 bytes; the high 12 must be zero.
    pub fn address(&self, index: usize) -> Result<Address, DecodeError> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(DecodeError::OutOfRange { field: "address" });
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address(bytes))
    }

    /// String result in either ABI encoding (offset, length, data) or the
    /// legacy bytes32 form some tokens return.
    pub fn string(&self) -> Result<String, DecodeError> {
        match self.dynamic_string() {
            Ok(s) => Ok(s),
            Err(dynamic_err) => {
                // bytes32 results are exactly one word
                if self.data.len() != WORD_SIZE {
                    return Err(dynamic_err);
                }
                let word = self.word(0)?;
                let end = word.iter().position(|b| *b == 0).unwrap_or(WORD_SIZE);
                std::str::from_utf8(&word[..end])
                    .map(str::to_string)
                    .map_err(|_| DecodeError::InvalidUtf8)
            }
        }
    }

    fn dynamic_string(&self) -> Result<String, DecodeError> {
        let offset = self.uint_usize(0)?;
        if offset % WORD_SIZE != 0 {
            return Err(DecodeError::BadOffset(offset));
        }
        let length_index = offset / WORD_SIZE;
        let length = self
            .uint_usize(length_index)
            .map_err(|_| DecodeError::BadOffset(offset))?;
        let start = offset + WORD_SIZE;
        let bytes = self
            .data
            .get(start..start + length)
            .ok_or(DecodeError::BadOffset(start))?;
        std::str::from_utf8(bytes)
            .map(|s| s.trim_end_matches('\0').to_string())
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}
