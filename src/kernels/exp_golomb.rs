//! This module contains the bit-addressed Exp-Golomb (order 0) stream used as the
//! entropy stage of the codec.
//!
//! Signed values are zig-zag mapped and shifted by one (`0 -> 1`, `1 -> 2`, `-1 -> 3`,
//! ...) so every code is non-empty, then written as `bits - 1` zero bits followed by the
//! `bits`-bit magnitude, MSB first. A zero coefficient therefore costs exactly one bit.
//!
//! The stream works over a fixed-size, reusable byte region rather than a growing
//! buffer. Bytes that the next pipeline stage has consumed are dropped with
//! [`ExpGolombStream::compact`], which preserves any byte that is still partially
//! written or partially read. All capacity checks happen before the buffer is touched.

use crate::error::CubeDctError;

/// The longest zero prefix a code for an `i32` can have (`i32::MIN` maps to `2^32 + 1`).
const MAX_PREFIX_ZEROES: u32 = 32;

/// Which side of the stream a compaction is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactMode {
    /// Drop bytes `0..upto` that were handed to the compressor; keep the partial byte.
    Writing,
    /// Drop every byte behind the read cursor; keep the unread bytes up to `upto`.
    Reading,
}

/// Bit-addressed Exp-Golomb stream over a bounded byte region.
///
/// The cursor is `(byte_offset, bit_offset)`, where `bit_offset` in `1..=8` counts the
/// bits still free (writing) or unread (reading) in the current byte, from the high bit.
#[derive(Debug, Clone)]
pub struct ExpGolombStream {
    buf: Vec<u8>,
    byte_offset: usize,
    bit_offset: u32,
    /// Number of valid bytes available to the reader.
    filled: usize,
}

//==================================================================================
// 1. Value Mapping
//==================================================================================

/// Maps a signed value to its non-zero coded magnitude.
#[inline]
pub fn coded_magnitude(value: i32) -> u64 {
    let v = value as i64;
    let zigzag = if v <= 0 { -2 * v } else { 2 * v - 1 };
    (zigzag + 1) as u64
}

/// Inverse of [`coded_magnitude`]. `None` when the result does not fit an `i32`.
#[inline]
pub fn value_from_magnitude(magnitude: u64) -> Option<i32> {
    let v = magnitude.checked_sub(1)? as i64;
    let value = if v % 2 != 0 { (v + 1) / 2 } else { -(v / 2) };
    i32::try_from(value).ok()
}

/// Number of bits the code for `value` occupies.
#[inline]
pub fn code_length(value: i32) -> u32 {
    let bits = 64 - coded_magnitude(value).leading_zeros();
    2 * bits - 1
}

//==================================================================================
// 2. Stream
//==================================================================================

impl ExpGolombStream {
    /// Creates a stream over a zeroed region of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)],
            byte_offset: 0,
            bit_offset: 8,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn bit_offset(&self) -> u32 {
        self.bit_offset
    }

    /// Absolute bit position of the cursor from the start of the region.
    fn bit_position(&self) -> usize {
        self.byte_offset * 8 + (8 - self.bit_offset as usize)
    }

    //------------------------------------------------------------------------------
    // Writing
    //------------------------------------------------------------------------------

    /// Appends the code for `value` at the cursor.
    pub fn write(&mut self, value: i32) -> Result<(), CubeDctError> {
        let magnitude = coded_magnitude(value);
        let bits = 64 - magnitude.leading_zeros();
        let zeroes = bits - 1;

        // The byte the cursor lands on must exist too: it is zeroed for the next write.
        let end_byte = (self.bit_position() + (zeroes + bits) as usize) / 8;
        if end_byte >= self.buf.len() {
            return Err(CubeDctError::ExpGolombCapacity {
                needed: end_byte + 1,
                capacity: self.buf.len(),
            });
        }

        self.put_bits(0, zeroes);
        self.put_bits(magnitude, bits);
        Ok(())
    }

    /// Packs the low `count` bits of `value`, MSB first. Capacity is checked by the caller.
    fn put_bits(&mut self, value: u64, count: u32) {
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(self.bit_offset);
            let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
            self.buf[self.byte_offset] |= chunk << (self.bit_offset - take);
            self.bit_offset -= take;
            remaining -= take;
            if self.bit_offset == 0 {
                self.byte_offset += 1;
                self.bit_offset = 8;
                self.buf[self.byte_offset] = 0;
            }
        }
    }

    /// Bytes fully written so far. The byte at this offset may hold a partial code.
    pub fn coded_len(&self) -> usize {
        self.byte_offset
    }

    /// The written region including the current (possibly partial) byte.
    ///
    /// Its length is `coded_len() + 1`. When the cursor sits on a byte boundary the
    /// final byte is all zero bits, which no reader mistakes for a code.
    pub fn written(&self) -> &[u8] {
        &self.buf[..=self.byte_offset]
    }

    //------------------------------------------------------------------------------
    // Reading
    //------------------------------------------------------------------------------

    /// Bytes available to the reader (produced by the decompressor, not yet compacted).
    pub fn filled_len(&self) -> usize {
        self.filled
    }

    /// The free tail of the region, to be filled by a producer.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Marks `count` bytes of [`Self::unfilled_mut`] as valid.
    pub fn commit_filled(&mut self, count: usize) -> Result<(), CubeDctError> {
        if self.filled + count > self.buf.len() {
            return Err(CubeDctError::ExpGolombCapacity {
                needed: self.filled + count,
                capacity: self.buf.len(),
            });
        }
        self.filled += count;
        Ok(())
    }

    /// Copies `bytes` into the free tail and marks them valid.
    pub fn extend_filled(&mut self, bytes: &[u8]) -> Result<(), CubeDctError> {
        let start = self.filled;
        let end = start + bytes.len();
        if end > self.buf.len() {
            return Err(CubeDctError::ExpGolombCapacity {
                needed: end,
                capacity: self.buf.len(),
            });
        }
        self.buf[start..end].copy_from_slice(bytes);
        self.filled = end;
        Ok(())
    }

    /// Whether the reader has consumed every complete byte produced so far.
    pub fn is_drained(&self) -> bool {
        self.byte_offset >= self.filled
    }

    /// Reads one value, failing if the filled region ends inside the code.
    pub fn read(&mut self) -> Result<i32, CubeDctError> {
        self.try_read()?.ok_or(CubeDctError::ExpGolombTruncated)
    }

    /// Reads one value if a complete code is available.
    ///
    /// Returns `Ok(None)` without moving the cursor when the filled region ends before
    /// the code does, so the caller can refill and retry. Trailing zero padding after
    /// the last code also reads as `None`.
    pub fn try_read(&mut self) -> Result<Option<i32>, CubeDctError> {
        let limit = self.filled * 8;
        let start = self.bit_position();

        // Leading zero count.
        let mut pos = start;
        let mut zeroes = 0u32;
        loop {
            if pos >= limit {
                return Ok(None);
            }
            if self.bit_at(pos) == 1 {
                break;
            }
            zeroes += 1;
            if zeroes > MAX_PREFIX_ZEROES {
                return Err(CubeDctError::ExpGolombCorrupt(format!(
                    "zero prefix longer than {} bits at bit {}",
                    MAX_PREFIX_ZEROES, start
                )));
            }
            pos += 1;
        }

        // The magnitude, including its leading 1.
        let bits = zeroes + 1;
        if pos + bits as usize > limit {
            return Ok(None);
        }
        let mut magnitude = 0u64;
        for _ in 0..bits {
            magnitude = (magnitude << 1) | self.bit_at(pos) as u64;
            pos += 1;
        }

        let value = value_from_magnitude(magnitude).ok_or_else(|| {
            CubeDctError::ExpGolombCorrupt(format!("magnitude {} overflows i32", magnitude))
        })?;

        self.byte_offset = pos / 8;
        self.bit_offset = 8 - (pos % 8) as u32;
        Ok(Some(value))
    }

    #[inline]
    fn bit_at(&self, pos: usize) -> u8 {
        (self.buf[pos / 8] >> (7 - (pos % 8))) & 1
    }

    //------------------------------------------------------------------------------
    // Compaction
    //------------------------------------------------------------------------------

    /// Discards bytes the next stage no longer needs, shifting the rest to the front.
    ///
    /// * `Writing`: `upto` is the number of bytes handed to the compressor. The bytes
    ///   from `upto` through the cursor byte move to the front and the cursor is rebased;
    ///   the bit offset is unchanged, so a partial byte keeps being filled.
    /// * `Reading`: `upto` is the producer's fill level. The unread bytes from the cursor
    ///   byte up to `upto` move to the front and the read cursor is rebased to byte 0,
    ///   keeping its bit offset inside that byte.
    ///
    /// Returns the number of bytes discarded.
    pub fn compact(&mut self, upto: usize, mode: CompactMode) -> usize {
        match mode {
            CompactMode::Writing => {
                if upto <= self.byte_offset {
                    self.buf.copy_within(upto..=self.byte_offset, 0);
                    self.byte_offset -= upto;
                    upto
                } else {
                    let dropped = self.byte_offset;
                    self.byte_offset = 0;
                    self.bit_offset = 8;
                    self.buf[0] = 0;
                    dropped
                }
            }
            CompactMode::Reading => {
                let end = upto.min(self.filled);
                let dropped = self.byte_offset.min(end);
                if dropped < end {
                    self.buf.copy_within(dropped..end, 0);
                }
                self.filled = end - dropped;
                self.byte_offset -= dropped;
                if self.byte_offset > 0 {
                    // The cursor had run past the fill level; nothing left to keep.
                    self.byte_offset = 0;
                    self.bit_offset = 8;
                }
                dropped
            }
        }
    }

    /// Rewinds the stream to an empty state, keeping the allocation.
    pub fn reset(&mut self) {
        self.byte_offset = 0;
        self.bit_offset = 8;
        self.filled = 0;
        self.buf[0] = 0;
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
