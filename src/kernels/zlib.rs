//! This module contains the zlib (deflate) streaming sessions that wrap the
//! Exp-Golomb coded bytes.
//!
//! This is the Final Stage transform in the codec, and the default one: a cubedct
//! bitstream is a single zlib stream spanning the whole run. Unlike a one-shot
//! `encode`/`decode` kernel, a session keeps deflate's history window alive across
//! batches, so matches can reach back into earlier cubes. It is a safe, panic-free
//! wrapper around `flate2`'s raw `Compress`/`Decompress` state machines.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::CubeDctError;
use crate::traits::{FlushMode, StreamCompressor, StreamDecompressor};

/// Growth step for the compressor's output vector.
const OUTPUT_CHUNK: usize = 32 * 1024;

//==================================================================================
// 1. Compression Session
//==================================================================================

pub struct ZlibCompressor {
    inner: Compress,
    finished: bool,
}

impl ZlibCompressor {
    /// Starts a zlib-framed session. `level` is clamped to 0..=9.
    pub fn new(level: i32) -> Self {
        let level = level.clamp(0, 9) as u32;
        Self {
            inner: Compress::new(Compression::new(level), true),
            finished: false,
        }
    }

    /// Total compressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}

impl StreamCompressor for ZlibCompressor {
    fn compress(
        &mut self,
        input: &[u8],
        flush: FlushMode,
        output: &mut Vec<u8>,
    ) -> Result<(), CubeDctError> {
        if self.finished {
            return Err(CubeDctError::SessionFinished);
        }
        let flush_mode = match flush {
            FlushMode::None => FlushCompress::None,
            FlushMode::Finish => FlushCompress::Finish,
        };

        let mut consumed = 0usize;
        loop {
            if output.capacity() - output.len() < OUTPUT_CHUNK / 2 {
                output.reserve(OUTPUT_CHUNK);
            }
            let in_before = self.inner.total_in();
            let out_before = self.inner.total_out();

            let status = self
                .inner
                .compress_vec(&input[consumed..], output, flush_mode)
                .map_err(|e| CubeDctError::ZlibError(e.to_string()))?;

            let read = (self.inner.total_in() - in_before) as usize;
            let written = (self.inner.total_out() - out_before) as usize;
            consumed += read;
            let out_full = output.len() == output.capacity();

            match status {
                Status::StreamEnd => {
                    self.finished = true;
                    return Ok(());
                }
                _ if flush == FlushMode::None && consumed == input.len() && !out_full => {
                    return Ok(());
                }
                _ if read == 0 && written == 0 && !out_full => {
                    return Err(CubeDctError::ZlibError(format!(
                        "deflate made no progress ({:?}) with {} input bytes left",
                        status,
                        input.len() - consumed
                    )));
                }
                _ => {}
            }
        }
    }
}

//==================================================================================
// 2. Decompression Session
//==================================================================================

pub struct ZlibDecompressor {
    inner: Decompress,
    ended: bool,
}

impl ZlibDecompressor {
    pub fn new() -> Self {
        Self {
            inner: Decompress::new(true),
            ended: false,
        }
    }

    /// Whether the end of the zlib stream has been reached.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl Default for ZlibDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecompressor for ZlibDecompressor {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), CubeDctError> {
        if self.ended || output.is_empty() {
            return Ok((0, 0));
        }
        let in_before = self.inner.total_in();
        let out_before = self.inner.total_out();

        let status = self
            .inner
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| CubeDctError::ZlibError(e.to_string()))?;
        if status == Status::StreamEnd {
            self.ended = true;
        }

        Ok((
            (self.inner.total_in() - in_before) as usize,
            (self.inner.total_out() - out_before) as usize,
        ))
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn inflate_all(compressed: &[u8], out_step: usize) -> Vec<u8> {
        let mut session = ZlibDecompressor::new();
        let mut result = Vec::new();
        let mut offset = 0;
        let mut scratch = vec![0u8; out_step];
        loop {
            let (read, written) = session.decompress(&compressed[offset..], &mut scratch).unwrap();
            offset += read;
            result.extend_from_slice(&scratch[..written]);
            if read == 0 && written == 0 {
                break;
            }
        }
        assert!(session.is_ended());
        result
    }

    #[test]
    fn test_session_roundtrip_across_calls() {
        let mut session = ZlibCompressor::new(9);
        let mut compressed = Vec::new();
        let parts: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 4_000]).collect();
        for part in &parts[..4] {
            session.compress(part, FlushMode::None, &mut compressed).unwrap();
        }
        session.compress(&parts[4], FlushMode::Finish, &mut compressed).unwrap();

        assert!(compressed.len() < 500);
        // zlib header: CMF 0x78.
        assert_eq!(compressed[0], 0x78);

        let expected: Vec<u8> = parts.concat();
        assert_eq!(inflate_all(&compressed, 333), expected);
    }

    #[test]
    fn test_finish_with_empty_input_is_valid() {
        let mut session = ZlibCompressor::new(6);
        let mut compressed = Vec::new();
        session.compress(&[], FlushMode::Finish, &mut compressed).unwrap();
        assert!(!compressed.is_empty());
        assert!(inflate_all(&compressed, 16).is_empty());
    }

    #[test]
    fn test_session_is_closed_after_finish() {
        let mut session = ZlibCompressor::new(6);
        let mut compressed = Vec::new();
        session.compress(b"abc", FlushMode::Finish, &mut compressed).unwrap();
        let err = session.compress(b"more", FlushMode::None, &mut compressed).unwrap_err();
        assert!(matches!(err, CubeDctError::SessionFinished));
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        let mut session = ZlibDecompressor::new();
        let mut out = [0u8; 64];
        let result = session.decompress(&[0xFF, 0x00, 0x13, 0x37, 0x42], &mut out);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("Zlib"));
        }
    }
}
