//! This module contains the Zstandard streaming sessions, the alternative
//! Final Stage transform for the coded byte stream.
//!
//! A run produces exactly one zstd frame. Compression pushes through the `zstd`
//! crate's `write::Encoder` into an owned `Vec<u8>` that is drained after every call.
//! Decompression drives the low-level `raw::Decoder` directly, so each call is bounded
//! by the caller's output slice and any undelivered output stays inside the context.

use std::io::Write;
use zstd::stream::raw::{Decoder as RawDecoder, Operation};
use zstd::stream::write::Encoder;

use crate::error::CubeDctError;
use crate::traits::{FlushMode, StreamCompressor, StreamDecompressor};

fn zstd_err(e: std::io::Error) -> CubeDctError {
    CubeDctError::ZstdError(e.to_string())
}

//==================================================================================
// 1. Compression Session
//==================================================================================

pub struct ZstdCompressor {
    // `None` once the frame has been finished.
    encoder: Option<Encoder<'static, Vec<u8>>>,
}

impl ZstdCompressor {
    /// Starts a session. `level` is clamped to 1..=22.
    pub fn new(level: i32) -> Result<Self, CubeDctError> {
        let encoder = Encoder::new(Vec::new(), level.clamp(1, 22)).map_err(zstd_err)?;
        Ok(Self {
            encoder: Some(encoder),
        })
    }
}

impl StreamCompressor for ZstdCompressor {
    fn compress(
        &mut self,
        input: &[u8],
        flush: FlushMode,
        output: &mut Vec<u8>,
    ) -> Result<(), CubeDctError> {
        let encoder = self.encoder.as_mut().ok_or(CubeDctError::SessionFinished)?;
        encoder.write_all(input).map_err(zstd_err)?;

        match flush {
            FlushMode::None => {
                output.append(encoder.get_mut());
            }
            FlushMode::Finish => {
                let encoder = self.encoder.take().ok_or(CubeDctError::SessionFinished)?;
                let mut tail = encoder.finish().map_err(zstd_err)?;
                output.append(&mut tail);
            }
        }
        Ok(())
    }
}

//==================================================================================
// 2. Decompression Session
//==================================================================================

pub struct ZstdDecompressor {
    decoder: RawDecoder<'static>,
}

impl ZstdDecompressor {
    pub fn new() -> Result<Self, CubeDctError> {
        Ok(Self {
            decoder: RawDecoder::new().map_err(zstd_err)?,
        })
    }
}

impl StreamDecompressor for ZstdDecompressor {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), CubeDctError> {
        if output.is_empty() {
            return Ok((0, 0));
        }
        // With empty input this drains output the context is still holding.
        let status = self
            .decoder
            .run_on_buffers(input, output)
            .map_err(zstd_err)?;
        Ok((status.bytes_read, status.bytes_written))
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
