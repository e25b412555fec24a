//! This module declares the pure codec kernels and provides the single entry point
//! for opening a compression session from a `CodecConfig`.
//!
//! Everything in here is synchronous and owns no I/O. The codec pipeline composes
//! these kernels; nothing here knows about frames or readers.

use crate::config::{CodecConfig, CompressorKind};
use crate::error::CubeDctError;
use crate::traits::{StreamCompressor, StreamDecompressor};

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Coefficient ordering
pub mod diagonal;

/// Value reduction
pub mod quantize;

/// Variable-length integer coding
pub mod exp_golomb;

/// Final Stage: byte-stream compression
pub mod zlib;
pub mod zstd;

//==================================================================================
// 2. Session Factories
//==================================================================================

/// Opens the compression session selected by `config`.
pub fn open_compressor(config: &CodecConfig) -> Result<Box<dyn StreamCompressor>, CubeDctError> {
    Ok(match config.compressor {
        CompressorKind::Zlib => Box::new(zlib::ZlibCompressor::new(config.compression_level)),
        CompressorKind::Zstd => Box::new(zstd::ZstdCompressor::new(config.compression_level)?),
    })
}

/// Opens the decompression session matching `config.compressor`.
pub fn open_decompressor(
    config: &CodecConfig,
) -> Result<Box<dyn StreamDecompressor>, CubeDctError> {
    Ok(match config.compressor {
        CompressorKind::Zlib => Box::new(zlib::ZlibDecompressor::new()),
        CompressorKind::Zstd => Box::new(zstd::ZstdDecompressor::new()?),
    })
}
