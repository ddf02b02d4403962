//! Fixed-width integers packed into 64-bit words.
//!
//! Entries never straddle a word boundary: each word holds `64 / bits` entries
//! starting at bit 0, and the leftover high bits are unused. This is the layout
//! Java chunk sections have used since 1.16.

use crate::error::CodecError;

/// Largest supported entry width.
pub const MAX_BITS: u8 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArray {
    words: Vec<u64>,
    bits: u8,
    capacity: usize,
}

impl PackedArray {
    /// Create a zero-filled array of `capacity` entries, `bits` wide each.
    pub fn new(bits: u8, capacity: usize) -> Self {
        debug_assert!(bits <= MAX_BITS);
        Self {
            words: vec![0; Self::required_words(bits, capacity)],
            bits,
            capacity,
        }
    }

    /// Wrap externally supplied words. The word count must match exactly.
    pub fn from_words(bits: u8, capacity: usize, words: Vec<u64>) -> Result<Self, CodecError> {
        let expected = Self::required_words(bits, capacity);
        if words.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                got: words.len(),
                bits,
            });
        }
        Ok(Self {
            words,
            bits,
            capacity,
        })
    }

    /// Number of words needed to hold `capacity` entries of `bits` each.
    pub fn required_words(bits: u8, capacity: usize) -> usize {
        if bits == 0 {
            return 0;
        }
        capacity.div_ceil(64 / bits as usize)
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Largest value an entry can hold.
    pub fn mask(&self) -> u64 {
        if self.bits == 0 {
            0
        } else {
            (1u64 << self.bits) - 1
        }
    }

    pub fn get(&self, index: usize) -> Result<u32, CodecError> {
        self.check_index(index)?;
        if self.bits == 0 {
            return Ok(0);
        }
        let (word, offset) = self.locate(index);
        Ok(((self.words[word] >> offset) & self.mask()) as u32)
    }

    /// Store `value` at `index`. With zero bits every entry is fixed at 0 and
    /// the call does nothing.
    pub fn set(&mut self, index: usize, value: u32) -> Result<(), CodecError> {
        self.check_index(index)?;
        if self.bits == 0 {
            return Ok(());
        }
        let mask = self.mask();
        if u64::from(value) > mask {
            return Err(CodecError::ValueTooLarge {
                value,
                bits: self.bits,
            });
        }
        let (word, offset) = self.locate(index);
        let w = &mut self.words[word];
        *w = (*w & !(mask << offset)) | (u64::from(value) << offset);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), CodecError> {
        if index >= self.capacity {
            return Err(CodecError::IndexOutOfBounds {
                index,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Word index and bit offset of an entry.
    fn locate(&self, index: usize) -> (usize, u32) {
        let per_word = 64 / self.bits as usize;
        let word = index / per_word;
        let offset = (index - word * per_word) * self.bits as usize;
        (word, offset as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_counts() {
        assert_eq!(PackedArray::required_words(0, 4096), 0);
        assert_eq!(PackedArray::required_words(1, 4096), 64);
        assert_eq!(PackedArray::required_words(4, 4096), 256);
        // 5 bits: 12 entries per word, 4 bits wasted
        assert_eq!(PackedArray::required_words(5, 4096), 342);
        assert_eq!(PackedArray::required_words(3, 64), 4);
        assert_eq!(PackedArray::required_words(32, 64), 32);
    }

    #[test]
    fn zero_bits_reads_zero_and_ignores_writes() {
        let mut arr = PackedArray::new(0, 4096);
        assert!(arr.words().is_empty());
        arr.set(100, 5).unwrap();
        assert_eq!(arr.get(100).unwrap(), 0);
        assert_eq!(arr.get(4095).unwrap(), 0);
    }

    #[test]
    fn set_get_every_width() {
        for bits in 1..=MAX_BITS {
            let capacity = 300;
            let mut arr = PackedArray::new(bits, capacity);
            let max = ((1u64 << bits) - 1) as u32;
            let value_for = |i: usize| ((i as u64 * 2_654_435_761) % (u64::from(max) + 1)) as u32;

            for i in 0..capacity {
                arr.set(i, value_for(i)).unwrap();
            }
            for i in 0..capacity {
                assert_eq!(arr.get(i).unwrap(), value_for(i), "bits={bits} index={i}");
            }

            // extremes
            arr.set(7, max).unwrap();
            assert_eq!(arr.get(7).unwrap(), max);
            arr.set(7, 0).unwrap();
            assert_eq!(arr.get(7).unwrap(), 0);
        }
    }

    #[test]
    fn set_does_not_disturb_neighbours() {
        for bits in [1u8, 3, 5, 7, 13, 21, 32] {
            let mut arr = PackedArray::new(bits, 128);
            let max = ((1u64 << bits) - 1) as u32;
            for i in 0..128 {
                arr.set(i, max).unwrap();
            }
            arr.set(64, 0).unwrap();
            for i in 0..128 {
                let expected = if i == 64 { 0 } else { max };
                assert_eq!(arr.get(i).unwrap(), expected, "bits={bits} index={i}");
            }
        }
    }

    #[test]
    fn out_of_range_index() {
        let mut arr = PackedArray::new(4, 16);
        assert_eq!(
            arr.get(16),
            Err(CodecError::IndexOutOfBounds {
                index: 16,
                capacity: 16
            })
        );
        assert!(arr.set(16, 1).is_err());
        // Even zero-width arrays validate the index.
        assert!(PackedArray::new(0, 16).get(16).is_err());
    }

    #[test]
    fn value_too_large() {
        let mut arr = PackedArray::new(4, 16);
        assert_eq!(
            arr.set(0, 16),
            Err(CodecError::ValueTooLarge { value: 16, bits: 4 })
        );
        assert_eq!(arr.get(0).unwrap(), 0);
    }

    #[test]
    fn from_words_checks_length() {
        assert!(PackedArray::from_words(4, 4096, vec![0; 256]).is_ok());
        assert_eq!(
            PackedArray::from_words(4, 4096, vec![0; 255]),
            Err(CodecError::LengthMismatch {
                expected: 256,
                got: 255,
                bits: 4
            })
        );
    }

    #[test]
    fn from_words_layout() {
        // 4 bits per entry: entry 1 sits in bits 4..8 of word 0, entry 16 in word 1.
        let mut words = vec![0u64; 2];
        words[0] = 0xA << 4;
        words[1] = 0x3;
        let arr = PackedArray::from_words(4, 32, words).unwrap();
        assert_eq!(arr.get(0).unwrap(), 0);
        assert_eq!(arr.get(1).unwrap(), 0xA);
        assert_eq!(arr.get(16).unwrap(), 0x3);
    }
}
